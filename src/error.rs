use thiserror::Error;

/// Boxed error returned by external collaborators such as the acoustic model.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum SpeechError {
    /// Frame configuration or precomputed tables are unusable. Raised at setup time.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Insufficient audio: got {samples} samples, need at least {window_length}")]
    InsufficientAudio { samples: usize, window_length: usize },

    #[error("Dimension mismatch: {what} expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Feature extraction cancelled after {frames_done} of {frames_total} frames")]
    Cancelled {
        frames_done: usize,
        frames_total: usize,
    },

    #[error("Acoustic model error: {0}")]
    Model(BoxError),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "assets")]
    #[error("Asset decode error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SpeechError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

pub type SpeechResult<T> = Result<T, SpeechError>;
