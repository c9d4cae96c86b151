//! Waveform to log-mel feature matrix.
//!
//! [`FrontEnd`] owns every table derived from a [`FrameConfig`]: transform tables, the
//! Hann window and the sparse filterbank. It is built once per acoustic model and
//! shared read-only between requests; each extraction allocates its own scratch.

pub mod features;
pub mod fft;
pub mod filterbank;

use crate::config::{FrameConfig, DEFAULT_PROGRESS_INTERVAL};
use crate::error::{SpeechError, SpeechResult};

pub use features::{frame_count, FeatureMatrix, NoProgress, Progress, ProgressSink};
pub use fft::Fft;
pub use filterbank::{SparseFilterbank, LOG_ENERGY_FLOOR};

use features::{hann_window, require_frames, FrameScratch};

#[derive(Debug, Clone)]
pub struct FrontEnd {
    config: FrameConfig,
    fft: Fft,
    filterbank: SparseFilterbank,
    window: Vec<f64>,
    progress_interval: usize,
}

impl FrontEnd {
    /// Build the tables for `config` around a filterbank supplied as a model asset.
    pub fn new(config: FrameConfig, filterbank: SparseFilterbank) -> SpeechResult<Self> {
        config.validate()?;

        if filterbank.num_mel_bins() != config.num_mel_bins {
            return Err(SpeechError::config(format!(
                "filterbank has {} mel bins, frame config expects {}",
                filterbank.num_mel_bins(),
                config.num_mel_bins
            )));
        }
        if filterbank.num_freq_bins() != config.num_freq_bins() {
            return Err(SpeechError::config(format!(
                "filterbank covers {} frequency bins, a {}-point transform yields {}",
                filterbank.num_freq_bins(),
                config.transform_size,
                config.num_freq_bins()
            )));
        }

        let fft = Fft::new(config.transform_size)?;
        let window = hann_window(config.window_length);

        Ok(Self {
            config,
            fft,
            filterbank,
            window,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        })
    }

    /// Build the tables with Slaney-style triangular filters derived from `config`.
    pub fn with_mel_filterbank(config: FrameConfig) -> SpeechResult<Self> {
        let filterbank = SparseFilterbank::mel(&config)?;
        Self::new(config, filterbank)
    }

    /// Frames computed between two progress checkpoints.
    pub fn with_progress_interval(mut self, frames: usize) -> SpeechResult<Self> {
        if frames == 0 {
            return Err(SpeechError::config("progress interval must be positive"));
        }
        self.progress_interval = frames;
        Ok(self)
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    pub fn filterbank(&self) -> &SparseFilterbank {
        &self.filterbank
    }

    pub fn progress_interval(&self) -> usize {
        self.progress_interval
    }

    /// Extract features without progress reporting.
    pub fn extract(&self, waveform: &[f32]) -> SpeechResult<FeatureMatrix> {
        self.extract_with_progress(waveform, NoProgress)
    }

    /// Extract features, checkpointing every `progress_interval` frames and once more at
    /// completion when the last block was partial.
    pub fn extract_with_progress<P>(
        &self,
        waveform: &[f32],
        mut progress: P,
    ) -> SpeechResult<FeatureMatrix>
    where
        P: ProgressSink,
    {
        let FrameConfig {
            transform_size,
            window_length,
            hop_length,
            num_mel_bins,
            ..
        } = self.config;

        let num_frames = require_frames(waveform.len(), window_length, hop_length)?;
        tracing::debug!(
            samples = waveform.len(),
            frames = num_frames,
            "extracting log-mel features"
        );

        let mut matrix = FeatureMatrix::zeros(num_frames, num_mel_bins);
        let mut scratch = FrameScratch::new(transform_size);

        for f in 0..num_frames {
            let start = f * hop_length;
            let samples = &waveform[start..start + window_length];
            // Samples past the window stay zero from construction.
            for ((slot, &sample), &w) in scratch.frame.iter_mut().zip(samples).zip(&self.window) {
                *slot = f64::from(sample) * w;
            }

            self.fft
                .process(&scratch.frame, &mut scratch.re, &mut scratch.im)?;
            Fft::power_spectrum(&scratch.re, &scratch.im, &mut scratch.power);
            self.filterbank.apply(&scratch.power, matrix.row_mut(f))?;

            let frames_done = f + 1;
            if frames_done % self.progress_interval == 0 || frames_done == num_frames {
                let report = Progress {
                    frames_done,
                    frames_total: num_frames,
                };
                if progress.checkpoint(report).is_break() {
                    tracing::debug!(
                        frames_done,
                        frames_total = num_frames,
                        "extraction cancelled"
                    );
                    return Err(SpeechError::Cancelled {
                        frames_done,
                        frames_total: num_frames,
                    });
                }
            }
        }

        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use std::ops::ControlFlow;

    use super::*;

    fn small_config() -> FrameConfig {
        FrameConfig {
            transform_size: 64,
            window_length: 48,
            hop_length: 16,
            num_mel_bins: 8,
            sample_rate: 16_000,
        }
    }

    #[test]
    fn mismatched_filterbank_is_rejected() {
        let filterbank = SparseFilterbank::mel(&FrameConfig::default()).unwrap();
        let error = FrontEnd::new(small_config(), filterbank).expect_err("shape mismatch");
        assert!(matches!(error, SpeechError::Configuration(_)));
    }

    #[test]
    fn filterbank_for_another_transform_size_is_rejected() {
        let filterbank = SparseFilterbank::mel(&FrameConfig::default()).unwrap();
        let config = FrameConfig {
            transform_size: 1024,
            ..FrameConfig::default()
        };
        assert_eq!(filterbank.num_mel_bins(), config.num_mel_bins);

        let error = FrontEnd::new(config, filterbank).expect_err("frequency bins differ");
        match error {
            SpeechError::Configuration(message) => assert!(message.contains("frequency bins")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_waveform_is_insufficient_audio() {
        let frontend = FrontEnd::with_mel_filterbank(small_config()).unwrap();
        let error = frontend
            .extract(&[0.1; 47])
            .expect_err("one sample short of a window");
        assert!(matches!(
            error,
            SpeechError::InsufficientAudio {
                samples: 47,
                window_length: 48
            }
        ));
    }

    #[test]
    fn row_count_follows_frame_formula() {
        let config = small_config();
        let frontend = FrontEnd::with_mel_filterbank(config).unwrap();

        for len in [48, 63, 64, 100, 1000] {
            let waveform: Vec<f32> = (0..len).map(|i| (i as f32 * 0.01).sin()).collect();
            let matrix = frontend.extract(&waveform).unwrap();
            let expected = (len - config.window_length) / config.hop_length + 1;
            assert_eq!(matrix.num_frames(), expected, "len {len}");
            assert_eq!(matrix.num_mel_bins(), config.num_mel_bins);
        }
    }

    #[test]
    fn silence_is_the_log_floor_everywhere() {
        let frontend = FrontEnd::with_mel_filterbank(FrameConfig::default()).unwrap();
        let matrix = frontend.extract(&vec![0.0; 16_000]).unwrap();

        let floor = LOG_ENERGY_FLOOR.ln() as f32;
        assert_eq!(matrix.num_frames(), 98);
        assert!(matrix.as_slice().iter().all(|&v| v == floor));
    }

    #[test]
    fn checkpoints_every_interval_and_at_the_end() {
        let frontend = FrontEnd::with_mel_filterbank(small_config())
            .unwrap()
            .with_progress_interval(10)
            .unwrap();
        // (48 + 16 * 24 - 48) / 16 + 1 = 25 frames.
        let waveform = vec![0.05f32; 48 + 16 * 24];

        let mut reports = Vec::new();
        let matrix = frontend
            .extract_with_progress(&waveform, |p: Progress| {
                reports.push(p.frames_done);
                ControlFlow::Continue(())
            })
            .unwrap();

        assert_eq!(matrix.num_frames(), 25);
        assert_eq!(reports, vec![10, 20, 25]);
    }

    #[test]
    fn break_at_checkpoint_cancels() {
        let frontend = FrontEnd::with_mel_filterbank(small_config())
            .unwrap()
            .with_progress_interval(4)
            .unwrap();
        let waveform = vec![0.0f32; 1000];

        let error = frontend
            .extract_with_progress(&waveform, |p: Progress| {
                if p.frames_done >= 8 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .expect_err("extraction should be cancelled");

        assert!(matches!(error, SpeechError::Cancelled { frames_done: 8, .. }));
    }

    #[test]
    fn louder_tone_raises_energy() {
        let config = FrameConfig::default();
        let frontend = FrontEnd::with_mel_filterbank(config).unwrap();
        let tone = |amp: f32| -> Vec<f32> {
            (0..4000)
                .map(|t| amp * (2.0 * std::f32::consts::PI * 1000.0 * t as f32 / 16_000.0).sin())
                .collect()
        };

        let quiet = frontend.extract(&tone(0.01)).unwrap();
        let loud = frontend.extract(&tone(0.5)).unwrap();
        let peak = |m: &FeatureMatrix| m.row(0).unwrap().iter().cloned().fold(f32::MIN, f32::max);
        assert!(peak(&loud) > peak(&quiet));
    }
}
