use std::path::Path;

use crate::config::SAMPLE_RATE_HZ;
use crate::error::{SpeechError, SpeechResult};

/// Requirements: 16 kHz, mono WAV file, PCM int16 or float32.
pub fn read_wav_samples(wav_path: &Path) -> SpeechResult<Vec<f32>> {
    let mut reader = hound::WavReader::open(wav_path)?;
    let spec = reader.spec();

    if spec.channels != 1 {
        return Err(SpeechError::Audio(format!(
            "Expected 1 channel, found {}",
            spec.channels
        )));
    }

    if spec.sample_rate != SAMPLE_RATE_HZ {
        return Err(SpeechError::Audio(format!(
            "Expected {SAMPLE_RATE_HZ} Hz sample rate, found {} Hz",
            spec.sample_rate
        )));
    }

    let samples = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|sample| sample.map(|s| f32::from(s) / 32_768.0))
            .collect::<Result<Vec<f32>, _>>()?,
        (hound::SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .map(|sample| sample.map(|s| s.clamp(-1.0, 1.0)))
            .collect::<Result<Vec<f32>, _>>()?,
        (format, bits) => {
            return Err(SpeechError::Audio(format!(
                "Expected 16-bit Int or 32-bit Float samples, found {bits}-bit {format:?}"
            )));
        }
    };

    tracing::debug!(
        path = %wav_path.display(),
        samples = samples.len(),
        "loaded wav"
    );

    Ok(samples)
}
