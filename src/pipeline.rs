//! Whole-utterance transcription: features, external model, decode, normalize.

use std::path::Path;
use std::sync::Arc;

use crate::audio;
use crate::ctc::{self, ScoreMatrix};
use crate::error::{BoxError, SpeechError, SpeechResult};
use crate::frontend::{FeatureMatrix, FrontEnd, NoProgress, ProgressSink};
use crate::text::{TextNormalizer, Vocabulary};
use crate::TranscriptionResult;

/// External acoustic model: one score row per feature frame.
pub trait AcousticModel {
    fn infer(&mut self, features: &FeatureMatrix) -> Result<ScoreMatrix, BoxError>;
}

impl<F> AcousticModel for F
where
    F: FnMut(&FeatureMatrix) -> Result<ScoreMatrix, BoxError>,
{
    fn infer(&mut self, features: &FeatureMatrix) -> Result<ScoreMatrix, BoxError> {
        self(features)
    }
}

/// Shared tables plus the vocabulary of one acoustic model.
#[derive(Debug, Clone)]
pub struct Transcriber {
    frontend: Arc<FrontEnd>,
    vocabulary: Arc<Vocabulary>,
    normalizer: TextNormalizer,
}

impl Transcriber {
    pub fn new(frontend: Arc<FrontEnd>, vocabulary: Arc<Vocabulary>) -> Self {
        Self {
            frontend,
            vocabulary,
            normalizer: TextNormalizer::default(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: TextNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn frontend(&self) -> &FrontEnd {
        &self.frontend
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn transcribe<M>(
        &self,
        model: &mut M,
        waveform: &[f32],
    ) -> SpeechResult<TranscriptionResult>
    where
        M: AcousticModel + ?Sized,
    {
        self.transcribe_with_progress(model, waveform, NoProgress)
    }

    pub fn transcribe_with_progress<M, P>(
        &self,
        model: &mut M,
        waveform: &[f32],
        progress: P,
    ) -> SpeechResult<TranscriptionResult>
    where
        M: AcousticModel + ?Sized,
        P: ProgressSink,
    {
        let features = self.frontend.extract_with_progress(waveform, progress)?;
        let scores = model.infer(&features).map_err(SpeechError::Model)?;
        self.check_scores(&features, &scores)?;

        let tokens = ctc::greedy_decode(&scores);
        let text = self.normalizer.transcript(&tokens, &self.vocabulary);

        tracing::info!(
            frames = features.num_frames(),
            tokens = tokens.len(),
            chars = text.len(),
            "transcribed utterance"
        );

        Ok(TranscriptionResult {
            text,
            tokens,
            num_frames: features.num_frames(),
        })
    }

    /// Transcribe a 16 kHz mono WAV file.
    pub fn transcribe_file<M>(
        &self,
        model: &mut M,
        wav_path: &Path,
    ) -> SpeechResult<TranscriptionResult>
    where
        M: AcousticModel + ?Sized,
    {
        let samples = audio::read_wav_samples(wav_path)?;
        self.transcribe(model, &samples)
    }

    fn check_scores(&self, features: &FeatureMatrix, scores: &ScoreMatrix) -> SpeechResult<()> {
        if scores.num_frames() != features.num_frames() {
            return Err(SpeechError::DimensionMismatch {
                what: "score matrix frames",
                expected: features.num_frames(),
                actual: scores.num_frames(),
            });
        }
        if scores.vocab_size() != self.vocabulary.len() {
            return Err(SpeechError::DimensionMismatch {
                what: "score matrix vocabulary width",
                expected: self.vocabulary.len(),
                actual: scores.vocab_size(),
            });
        }
        Ok(())
    }
}
