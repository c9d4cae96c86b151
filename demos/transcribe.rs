//! Replays acoustic-model scores dumped offline against a WAV file.
//!
//! cargo run --example transcribe -- <audio.wav> <vocab.json> <scores.json>
//!
//! `scores.json` holds one array of vocabulary scores per feature frame.

use std::path::PathBuf;
use std::sync::Arc;

use scribe_speech::{
    AcousticModel, BoxError, FeatureMatrix, FrameConfig, FrontEnd, ScoreMatrix, Transcriber,
    Vocabulary,
};

struct ReplayModel {
    rows: Vec<Vec<f32>>,
}

impl AcousticModel for ReplayModel {
    fn infer(&mut self, features: &FeatureMatrix) -> Result<ScoreMatrix, BoxError> {
        println!(
            "features: {} frames x {} mel bins",
            features.num_frames(),
            features.num_mel_bins()
        );
        Ok(ScoreMatrix::from_rows(&self.rows)?)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();

    let wav_path = PathBuf::from(
        args.get(1)
            .map(|value| value.as_str())
            .unwrap_or("samples/dictation.wav"),
    );
    let vocab_path = PathBuf::from(
        args.get(2)
            .map(|value| value.as_str())
            .unwrap_or("models/vocab.json"),
    );
    let scores_path = PathBuf::from(
        args.get(3)
            .map(|value| value.as_str())
            .unwrap_or("models/scores.json"),
    );

    let frontend = FrontEnd::with_mel_filterbank(FrameConfig::default())?;
    let vocabulary = Vocabulary::load(&vocab_path)?;
    let rows: Vec<Vec<f32>> = serde_json::from_str(&std::fs::read_to_string(&scores_path)?)?;

    let transcriber = Transcriber::new(Arc::new(frontend), Arc::new(vocabulary));
    let mut model = ReplayModel { rows };

    let result = transcriber.transcribe_file(&mut model, &wav_path)?;

    println!("{}", result.text);
    println!("tokens: {:?}", result.tokens);

    Ok(())
}
