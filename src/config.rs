//! Frame configuration shared by the transform, filterbank and extractor.

#[cfg(feature = "assets")]
use std::path::Path;

#[cfg(feature = "assets")]
use serde::{Deserialize, Serialize};

use crate::error::{SpeechError, SpeechResult};

/// Sample rate every acoustic model in this crate expects.
pub const SAMPLE_RATE_HZ: u32 = 16_000;

/// Frames computed between two progress checkpoints.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 200;

/// Framing parameters of one acoustic model.
///
/// Window and hop length are part of the model contract: the twiddle table and the
/// filterbank are derived from these values, so a `FrameConfig` is never mutated after
/// a [`FrontEnd`](crate::frontend::FrontEnd) has been built from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "assets", derive(Deserialize, Serialize))]
pub struct FrameConfig {
    pub transform_size: usize,
    pub window_length: usize,
    pub hop_length: usize,
    pub num_mel_bins: usize,
    #[cfg_attr(feature = "assets", serde(default = "default_sample_rate"))]
    pub sample_rate: u32,
}

#[cfg(feature = "assets")]
fn default_sample_rate() -> u32 {
    SAMPLE_RATE_HZ
}

impl Default for FrameConfig {
    /// 25 ms window, 10 ms hop, 80 mel bins at 16 kHz.
    fn default() -> Self {
        Self {
            transform_size: 512,
            window_length: 400,
            hop_length: 160,
            num_mel_bins: 80,
            sample_rate: SAMPLE_RATE_HZ,
        }
    }
}

impl FrameConfig {
    /// Number of non-redundant spectrum bins for a real input, `transform_size / 2 + 1`.
    pub fn num_freq_bins(&self) -> usize {
        self.transform_size / 2 + 1
    }

    pub fn validate(&self) -> SpeechResult<()> {
        if self.transform_size < 2 || !self.transform_size.is_power_of_two() {
            return Err(SpeechError::config(format!(
                "transform size must be a power of two >= 2, got {}",
                self.transform_size
            )));
        }

        // The non-periodic Hann window divides by `window_length - 1`.
        if self.window_length < 2 || self.window_length > self.transform_size {
            return Err(SpeechError::config(format!(
                "window length must be in 2..={}, got {}",
                self.transform_size, self.window_length
            )));
        }

        if self.hop_length == 0 {
            return Err(SpeechError::config("hop length must be positive"));
        }

        if self.num_mel_bins == 0 {
            return Err(SpeechError::config("number of mel bins must be positive"));
        }

        if self.sample_rate == 0 {
            return Err(SpeechError::config("sample rate must be positive"));
        }

        Ok(())
    }

    #[cfg(feature = "assets")]
    pub fn from_json_str(json: &str) -> SpeechResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "assets")]
    pub fn load(path: &Path) -> SpeechResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
