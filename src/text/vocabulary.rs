use std::path::Path;

use crate::error::{SpeechError, SpeechResult};

/// Ordered token pieces. Id 0 is the CTC blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    pieces: Vec<String>,
}

impl Vocabulary {
    pub fn new(pieces: Vec<String>) -> SpeechResult<Self> {
        if pieces.is_empty() {
            return Err(SpeechError::config("vocabulary is empty"));
        }
        Ok(Self { pieces })
    }

    /// One piece per line. Trailing `\r` is stripped; surrounding spaces are kept
    /// because they can be part of a piece.
    pub fn from_lines(text: &str) -> SpeechResult<Self> {
        let pieces = text
            .lines()
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();
        Self::new(pieces)
    }

    /// A JSON array of strings, index = token id.
    #[cfg(feature = "assets")]
    pub fn from_json_str(json: &str) -> SpeechResult<Self> {
        let pieces: Vec<String> = serde_json::from_str(json)?;
        Self::new(pieces)
    }

    /// Load a `.json` array or a plain one-piece-per-line file.
    pub fn load(path: &Path) -> SpeechResult<Self> {
        let text = std::fs::read_to_string(path)?;

        #[cfg(feature = "assets")]
        {
            if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
                return Self::from_json_str(&text);
            }
        }

        Self::from_lines(&text)
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn piece(&self, id: usize) -> Option<&str> {
        self.pieces.get(id).map(String::as_str)
    }

    /// Concatenate the pieces of `ids`. Ids outside the vocabulary are skipped.
    pub fn concat(&self, ids: &[usize]) -> String {
        let mut skipped = 0usize;
        let text = ids.iter().fold(String::new(), |mut text, &id| {
            match self.piece(id) {
                Some(piece) => text.push_str(piece),
                None => skipped += 1,
            }
            text
        });

        if skipped > 0 {
            tracing::warn!(
                skipped,
                vocab_size = self.len(),
                "skipped out-of-range token ids"
            );
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(pieces: &[&str]) -> Vocabulary {
        Vocabulary::new(pieces.iter().map(|p| p.to_string()).collect()).unwrap()
    }

    #[test]
    fn concatenates_in_order() {
        let vocab = vocab(&["<blank>", "\u{2581}ex", "am", "{period}"]);
        assert_eq!(vocab.concat(&[1, 2, 3]), "\u{2581}exam{period}");
    }

    #[test]
    fn out_of_range_ids_are_skipped() {
        let vocab = vocab(&["<blank>", "a", "b"]);
        assert_eq!(vocab.concat(&[1, 7, 2, 3]), "ab");
    }

    #[test]
    fn empty_vocabulary_is_rejected() {
        assert!(Vocabulary::new(Vec::new()).is_err());
    }

    #[test]
    fn parses_line_asset() {
        let vocab = Vocabulary::from_lines("<blank>\r\n\u{2581}the\r\n s\n").unwrap();
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.piece(1), Some("\u{2581}the"));
        assert_eq!(vocab.piece(2), Some(" s"));
    }

    #[cfg(feature = "assets")]
    #[test]
    fn parses_json_asset() {
        let vocab = Vocabulary::from_json_str(r#"["<blank>", "{comma}", "▁no"]"#).unwrap();
        assert_eq!(vocab.piece(2), Some("\u{2581}no"));
        assert_eq!(vocab.piece(3), None);
    }
}
