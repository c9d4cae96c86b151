//! Radix-2 decimation-in-time transform with precomputed tables.
//!
//! All arithmetic runs in `f64` so rounding error does not accumulate across the
//! `log2(n)` butterfly stages.

use std::f64::consts::PI;

use crate::error::{SpeechError, SpeechResult};

/// Fixed-size transform. Tables are built once and only read afterwards.
#[derive(Debug, Clone)]
pub struct Fft {
    size: usize,
    bit_reversal: Vec<usize>,
    /// Stage with half-size `h` stores its `h` coefficients at `[h - 1, 2h - 1)`.
    twiddles: Vec<(f64, f64)>,
}

impl Fft {
    pub fn new(size: usize) -> SpeechResult<Self> {
        if size < 2 || !size.is_power_of_two() {
            return Err(SpeechError::config(format!(
                "transform size must be a power of two >= 2, got {size}"
            )));
        }

        let bits = size.trailing_zeros();
        let bit_reversal = (0..size)
            .map(|i| i.reverse_bits() >> (usize::BITS - bits))
            .collect();

        let mut twiddles = Vec::with_capacity(size - 1);
        let mut half = 1;
        while half < size {
            let span = (half * 2) as f64;
            for k in 0..half {
                let angle = -2.0 * PI * (k as f64) / span;
                twiddles.push((angle.cos(), angle.sin()));
            }
            half *= 2;
        }

        tracing::debug!(size, twiddles = twiddles.len(), "built transform tables");

        Ok(Self {
            size,
            bit_reversal,
            twiddles,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Transform a real buffer of exactly `size` samples into `re`/`im`.
    ///
    /// Callers own the output buffers and reuse them across frames; nothing is
    /// allocated here.
    pub fn process<T>(&self, input: &[T], re: &mut [f64], im: &mut [f64]) -> SpeechResult<()>
    where
        T: Copy + Into<f64>,
    {
        for (what, len) in [
            ("transform input", input.len()),
            ("transform real output", re.len()),
            ("transform imaginary output", im.len()),
        ] {
            if len != self.size {
                return Err(SpeechError::DimensionMismatch {
                    what,
                    expected: self.size,
                    actual: len,
                });
            }
        }

        for (i, &sample) in input.iter().enumerate() {
            let j = self.bit_reversal[i];
            re[j] = sample.into();
            im[j] = 0.0;
        }

        let mut half = 1;
        while half < self.size {
            let span = half * 2;
            let stage = &self.twiddles[half - 1..span - 1];
            for start in (0..self.size).step_by(span) {
                for (k, &(wr, wi)) in stage.iter().enumerate() {
                    let a = start + k;
                    let b = a + half;
                    let tr = wr * re[b] - wi * im[b];
                    let ti = wr * im[b] + wi * re[b];
                    re[b] = re[a] - tr;
                    im[b] = im[a] - ti;
                    re[a] += tr;
                    im[a] += ti;
                }
            }
            half = span;
        }

        Ok(())
    }

    /// Write `re² + im²` for the first `out.len()` bins (normally `size / 2 + 1`).
    pub fn power_spectrum(re: &[f64], im: &[f64], out: &mut [f64]) {
        for ((p, &r), &i) in out.iter_mut().zip(re).zip(im) {
            *p = r * r + i * i;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_dft(input: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let n = input.len();
        let mut re = vec![0.0; n];
        let mut im = vec![0.0; n];
        for k in 0..n {
            for (t, &x) in input.iter().enumerate() {
                let angle = -2.0 * PI * (k * t) as f64 / n as f64;
                re[k] += x * angle.cos();
                im[k] += x * angle.sin();
            }
        }
        (re, im)
    }

    #[test]
    fn rejects_non_power_of_two_sizes() {
        for size in [0, 1, 3, 400, 1000] {
            let error = Fft::new(size).expect_err("size should be rejected");
            assert!(matches!(error, SpeechError::Configuration(_)), "size {size}");
        }
    }

    #[test]
    fn bit_reversal_for_eight_points() {
        let fft = Fft::new(8).unwrap();
        assert_eq!(fft.bit_reversal, vec![0, 4, 2, 6, 1, 5, 3, 7]);
        assert_eq!(fft.twiddles.len(), 7);
    }

    #[test]
    fn matches_direct_dft() {
        let input = [
            0.5, -1.0, 0.25, 2.0, 0.0, -0.75, 1.5, 0.125, -0.5, 0.3, 0.9, -2.0, 0.0, 0.0, 1.0, -1.0,
        ];
        let fft = Fft::new(input.len()).unwrap();
        let mut re = vec![0.0; input.len()];
        let mut im = vec![0.0; input.len()];
        fft.process(&input, &mut re, &mut im).unwrap();

        let (want_re, want_im) = naive_dft(&input);
        for k in 0..input.len() {
            assert!((re[k] - want_re[k]).abs() < 1e-9, "re[{k}]");
            assert!((im[k] - want_im[k]).abs() < 1e-9, "im[{k}]");
        }
    }

    #[test]
    fn impulse_has_flat_spectrum() {
        let mut input = vec![0.0f32; 32];
        input[0] = 1.0;
        let fft = Fft::new(32).unwrap();
        let mut re = vec![0.0; 32];
        let mut im = vec![0.0; 32];
        fft.process(&input, &mut re, &mut im).unwrap();

        for k in 0..32 {
            assert!((re[k] - 1.0).abs() < 1e-12);
            assert!(im[k].abs() < 1e-12);
        }
    }

    #[test]
    fn sinusoid_peaks_at_nearest_bin() {
        let size = 512;
        let sample_rate = 16_000.0;
        let fft = Fft::new(size).unwrap();

        for freq in [440.0, 1000.0, 2750.0, 6100.0] {
            let input: Vec<f32> = (0..size)
                .map(|t| (2.0 * PI * freq * t as f64 / sample_rate).sin() as f32)
                .collect();
            let mut re = vec![0.0; size];
            let mut im = vec![0.0; size];
            fft.process(&input, &mut re, &mut im).unwrap();

            let mut power = vec![0.0; size / 2 + 1];
            Fft::power_spectrum(&re, &im, &mut power);
            let peak = power
                .iter()
                .enumerate()
                .fold(0, |best, (k, &p)| if p > power[best] { k } else { best });

            let expected = (freq * size as f64 / sample_rate).round() as usize;
            assert!(
                peak.abs_diff(expected) <= 1,
                "freq {freq}: peak bin {peak}, expected {expected}"
            );
        }
    }

    #[test]
    fn wrong_buffer_length_is_reported() {
        let fft = Fft::new(16).unwrap();
        let mut re = vec![0.0; 16];
        let mut im = vec![0.0; 16];
        let error = fft
            .process(&[0.0f32; 8], &mut re, &mut im)
            .expect_err("short input should fail");
        assert!(matches!(
            error,
            SpeechError::DimensionMismatch {
                expected: 16,
                actual: 8,
                ..
            }
        ));
    }
}
