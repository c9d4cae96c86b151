//! Speech-to-text front end for on-device dictation.
//!
//! waveform -> [`FrontEnd`] -> feature matrix -> external [`AcousticModel`] ->
//! score matrix -> greedy CTC decode -> token ids -> [`TextNormalizer`] -> transcript.

pub mod audio;
pub mod config;
pub mod ctc;
pub mod error;
pub mod frontend;
pub mod pipeline;
pub mod text;

pub use config::FrameConfig;
pub use ctc::{greedy_decode, ScoreMatrix, BLANK_ID};
pub use error::{BoxError, SpeechError, SpeechResult};
pub use frontend::{FeatureMatrix, FrontEnd, Progress, SparseFilterbank};
pub use pipeline::{AcousticModel, Transcriber};
pub use text::{TextNormalizer, Vocabulary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionResult {
    pub text: String,
    /// Non-blank token ids that survived decoding.
    pub tokens: Vec<usize>,
    /// Feature frames the acoustic model scored.
    pub num_frames: usize,
}
