//! Vocabulary lookup and transcript normalization.

pub mod normalize;
pub mod vocabulary;

pub use normalize::{normalize, TextNormalizer, WORD_BOUNDARY};
pub use vocabulary::Vocabulary;
