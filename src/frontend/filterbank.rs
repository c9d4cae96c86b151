//! Sparse mel filterbank and log compression.

use crate::config::FrameConfig;
use crate::error::{SpeechError, SpeechResult};

/// Energy floor applied before the natural log. Acoustic models are trained against
/// exactly this value, so it is not configurable.
pub const LOG_ENERGY_FLOOR: f64 = 1e-5;

/// Non-zero weights of one mel bin.
#[derive(Debug, Clone, Default, PartialEq)]
struct MelBin {
    indices: Vec<usize>,
    weights: Vec<f64>,
}

/// Triangular mel filters keeping only their non-zero `(frequency bin, weight)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseFilterbank {
    bins: Vec<MelBin>,
    num_freq_bins: usize,
}

impl SparseFilterbank {
    /// Sparsify a dense `num_mel_bins x num_freq_bins` matrix given as rows.
    ///
    /// Entries that are exactly zero are dropped. Negative or non-finite weights are a
    /// configuration error.
    pub fn from_dense<R>(rows: &[R]) -> SpeechResult<Self>
    where
        R: AsRef<[f32]>,
    {
        let Some(first) = rows.first() else {
            return Err(SpeechError::config("filterbank has no mel bins"));
        };
        let num_freq_bins = first.as_ref().len();
        if num_freq_bins == 0 {
            return Err(SpeechError::config("filterbank has no frequency bins"));
        }

        let mut bins = Vec::with_capacity(rows.len());
        for (m, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != num_freq_bins {
                return Err(SpeechError::config(format!(
                    "filterbank row {m} has {} frequency bins, expected {num_freq_bins}",
                    row.len()
                )));
            }

            let mut bin = MelBin::default();
            for (k, &weight) in row.iter().enumerate() {
                if !weight.is_finite() || weight < 0.0 {
                    return Err(SpeechError::config(format!(
                        "filterbank weight [{m}][{k}] must be finite and non-negative, got {weight}"
                    )));
                }
                if weight != 0.0 {
                    bin.indices.push(k);
                    bin.weights.push(f64::from(weight));
                }
            }
            bins.push(bin);
        }

        let filterbank = Self {
            bins,
            num_freq_bins,
        };
        tracing::debug!(
            mel_bins = filterbank.num_mel_bins(),
            freq_bins = num_freq_bins,
            density = filterbank.density(),
            "sparsified mel filterbank"
        );

        Ok(filterbank)
    }

    /// Parse a dense matrix asset: a JSON array of `num_mel_bins` rows.
    #[cfg(feature = "assets")]
    pub fn from_dense_json(json: &str) -> SpeechResult<Self> {
        let rows: Vec<Vec<f32>> = serde_json::from_str(json)?;
        Self::from_dense(&rows)
    }

    /// Slaney-style triangular filters spanning 0 Hz to Nyquist for `config`.
    pub fn mel(config: &FrameConfig) -> SpeechResult<Self> {
        config.validate()?;
        Self::from_dense(&slaney_mel_filters(config))
    }

    pub fn num_mel_bins(&self) -> usize {
        self.bins.len()
    }

    pub fn num_freq_bins(&self) -> usize {
        self.num_freq_bins
    }

    /// Fraction of the dense matrix that is actually stored.
    pub fn density(&self) -> f64 {
        let kept: usize = self.bins.iter().map(|bin| bin.indices.len()).sum();
        kept as f64 / (self.bins.len() * self.num_freq_bins) as f64
    }

    /// Map one power spectrum (`num_freq_bins` values) to `num_mel_bins` log energies.
    pub fn apply(&self, power: &[f64], out: &mut [f32]) -> SpeechResult<()> {
        if power.len() != self.num_freq_bins {
            return Err(SpeechError::DimensionMismatch {
                what: "power spectrum bins",
                expected: self.num_freq_bins,
                actual: power.len(),
            });
        }
        if out.len() != self.bins.len() {
            return Err(SpeechError::DimensionMismatch {
                what: "mel output bins",
                expected: self.bins.len(),
                actual: out.len(),
            });
        }

        for (bin, energy) in self.bins.iter().zip(out.iter_mut()) {
            let sum: f64 = bin
                .indices
                .iter()
                .zip(&bin.weights)
                .map(|(&k, &w)| power[k] * w)
                .sum();
            *energy = sum.max(LOG_ENERGY_FLOOR).ln() as f32;
        }

        Ok(())
    }
}

fn hertz_to_mel(freq: f64) -> f64 {
    const MIN_LOG_HZ: f64 = 1000.0;
    const MIN_LOG_MEL: f64 = 15.0;
    let logstep = 6.4f64.ln() / 27.0;

    if freq >= MIN_LOG_HZ {
        MIN_LOG_MEL + (freq / MIN_LOG_HZ).ln() / logstep
    } else {
        3.0 * freq / 200.0
    }
}

fn mel_to_hertz(mels: f64) -> f64 {
    const MIN_LOG_HZ: f64 = 1000.0;
    const MIN_LOG_MEL: f64 = 15.0;
    let logstep = 6.4f64.ln() / 27.0;

    if mels >= MIN_LOG_MEL {
        MIN_LOG_HZ * (logstep * (mels - MIN_LOG_MEL)).exp()
    } else {
        200.0 * mels / 3.0
    }
}

/// Dense area-normalized triangular filters, one row per mel bin.
fn slaney_mel_filters(config: &FrameConfig) -> Vec<Vec<f32>> {
    let num_freq = config.num_freq_bins();
    let num_mel = config.num_mel_bins;
    let sample_rate = f64::from(config.sample_rate);

    let fft_freqs: Vec<f64> = (0..num_freq)
        .map(|k| k as f64 * sample_rate / config.transform_size as f64)
        .collect();

    let mel_min = hertz_to_mel(0.0);
    let mel_max = hertz_to_mel(sample_rate / 2.0);
    let edges: Vec<f64> = (0..num_mel + 2)
        .map(|i| mel_to_hertz(mel_min + (mel_max - mel_min) * i as f64 / (num_mel + 1) as f64))
        .collect();

    (0..num_mel)
        .map(|m| {
            let lower = (edges[m + 1] - edges[m]).max(1e-6);
            let upper = (edges[m + 2] - edges[m + 1]).max(1e-6);
            let enorm = 2.0 / (edges[m + 2] - edges[m]);
            fft_freqs
                .iter()
                .map(|&f| {
                    let down = (f - edges[m]) / lower;
                    let up = (edges[m + 2] - f) / upper;
                    (down.min(up).max(0.0) * enorm) as f32
                })
                .collect()
        })
        .collect()
}
