//! Framing, windowing and the log-mel feature matrix.

use std::ops::ControlFlow;

use crate::error::{SpeechError, SpeechResult};

/// Non-periodic Hann window: `0.5 * (1 - cos(2πi / (len - 1)))`.
pub(crate) fn hann_window(len: usize) -> Vec<f64> {
    let denom = (len - 1) as f64;
    (0..len)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / denom).cos()))
        .collect()
}

/// `floor((len - window) / hop) + 1`, or `None` when not even one window fits.
pub fn frame_count(len: usize, window_length: usize, hop_length: usize) -> Option<usize> {
    if hop_length == 0 || len < window_length {
        return None;
    }
    Some((len - window_length) / hop_length + 1)
}

/// Progress reported at every checkpoint of an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub frames_done: usize,
    pub frames_total: usize,
}

impl Progress {
    /// Completion in percent, `0.0..=100.0`.
    pub fn percent(&self) -> f32 {
        if self.frames_total == 0 {
            return 100.0;
        }
        (self.frames_done as f64 * 100.0 / self.frames_total as f64) as f32
    }

    pub fn is_complete(&self) -> bool {
        self.frames_done >= self.frames_total
    }
}

/// Checkpoint hook. Returning [`ControlFlow::Break`] abandons the extraction.
pub trait ProgressSink {
    fn checkpoint(&mut self, progress: Progress) -> ControlFlow<()>;
}

impl<F> ProgressSink for F
where
    F: FnMut(Progress) -> ControlFlow<()>,
{
    fn checkpoint(&mut self, progress: Progress) -> ControlFlow<()> {
        self(progress)
    }
}

/// Sink for callers that do not track progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn checkpoint(&mut self, _progress: Progress) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

/// Row-major `num_frames x num_mel_bins` log-mel energies.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    data: Vec<f32>,
    num_frames: usize,
    num_mel_bins: usize,
}

impl FeatureMatrix {
    pub(crate) fn zeros(num_frames: usize, num_mel_bins: usize) -> Self {
        Self {
            data: vec![0.0; num_frames * num_mel_bins],
            num_frames,
            num_mel_bins,
        }
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn num_mel_bins(&self) -> usize {
        self.num_mel_bins
    }

    /// `(num_frames, num_mel_bins)`
    pub fn shape(&self) -> (usize, usize) {
        (self.num_frames, self.num_mel_bins)
    }

    pub fn row(&self, frame: usize) -> Option<&[f32]> {
        if frame >= self.num_frames {
            return None;
        }
        let start = frame * self.num_mel_bins;
        Some(&self.data[start..start + self.num_mel_bins])
    }

    pub(crate) fn row_mut(&mut self, frame: usize) -> &mut [f32] {
        let start = frame * self.num_mel_bins;
        &mut self.data[start..start + self.num_mel_bins]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.num_mel_bins)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

/// Per-request scratch space, sized once and reused for every frame.
pub(crate) struct FrameScratch {
    pub(crate) frame: Vec<f64>,
    pub(crate) re: Vec<f64>,
    pub(crate) im: Vec<f64>,
    pub(crate) power: Vec<f64>,
}

impl FrameScratch {
    pub(crate) fn new(transform_size: usize) -> Self {
        Self {
            frame: vec![0.0; transform_size],
            re: vec![0.0; transform_size],
            im: vec![0.0; transform_size],
            power: vec![0.0; transform_size / 2 + 1],
        }
    }
}

/// Raise `InsufficientAudio` when not even one window fits.
pub(crate) fn require_frames(
    samples: usize,
    window_length: usize,
    hop_length: usize,
) -> SpeechResult<usize> {
    frame_count(samples, window_length, hop_length).ok_or(SpeechError::InsufficientAudio {
        samples,
        window_length,
    })
}
