//! Greedy CTC decoding of per-frame acoustic scores.

use crate::error::{SpeechError, SpeechResult};

/// Reserved blank (no symbol) token id.
pub const BLANK_ID: usize = 0;

/// Row-major `num_frames x vocab_size` scores produced by the acoustic model.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    data: Vec<f32>,
    num_frames: usize,
    vocab_size: usize,
}

impl ScoreMatrix {
    pub fn new(data: Vec<f32>, num_frames: usize, vocab_size: usize) -> SpeechResult<Self> {
        if vocab_size == 0 {
            return Err(SpeechError::DimensionMismatch {
                what: "score matrix vocabulary width",
                expected: 1,
                actual: 0,
            });
        }
        let expected = num_frames
            .checked_mul(vocab_size)
            .ok_or(SpeechError::DimensionMismatch {
                what: "score matrix frames",
                expected: usize::MAX / vocab_size,
                actual: num_frames,
            })?;
        if data.len() != expected {
            return Err(SpeechError::DimensionMismatch {
                what: "score matrix elements",
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            data,
            num_frames,
            vocab_size,
        })
    }

    /// Build from per-frame rows, which must all have the same width.
    pub fn from_rows<R>(rows: &[R]) -> SpeechResult<Self>
    where
        R: AsRef<[f32]>,
    {
        let vocab_size = rows.first().map_or(0, |row| row.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * vocab_size);
        for row in rows {
            let row = row.as_ref();
            if row.len() != vocab_size {
                return Err(SpeechError::DimensionMismatch {
                    what: "score matrix row width",
                    expected: vocab_size,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Self::new(data, rows.len(), vocab_size)
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.vocab_size)
    }
}

/// Index of the highest score. Ties go to the lowest index.
pub fn argmax(scores: &[f32]) -> usize {
    let mut best = BLANK_ID;
    let mut best_score = f32::NEG_INFINITY;
    for (idx, &score) in scores.iter().enumerate() {
        if idx == 0 || score > best_score {
            best = idx;
            best_score = score;
        }
    }
    best
}

/// Skip blanks and collapse immediate repeats. A blank between two equal symbols
/// keeps both.
pub fn greedy_decode(scores: &ScoreMatrix) -> Vec<usize> {
    let mut tokens = Vec::new();
    let mut prev = None;

    for row in scores.rows() {
        let best = argmax(row);
        if best != BLANK_ID && prev != Some(best) {
            tokens.push(best);
        }
        prev = Some(best);
    }

    tracing::debug!(
        frames = scores.num_frames(),
        tokens = tokens.len(),
        "greedy ctc decode"
    );
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One-hot score rows for the given argmax path.
    fn path(ids: &[usize], vocab_size: usize) -> ScoreMatrix {
        let rows: Vec<Vec<f32>> = ids
            .iter()
            .map(|&id| {
                let mut row = vec![0.1; vocab_size];
                row[id] = 0.9;
                row
            })
            .collect();
        ScoreMatrix::from_rows(&rows).unwrap()
    }

    #[test]
    fn single_dominant_frame() {
        let scores = ScoreMatrix::new(vec![-3.0, -1.0, 4.5, -0.5], 1, 4).unwrap();
        assert_eq!(greedy_decode(&scores), vec![2]);
    }

    #[test]
    fn blank_separated_repeats_are_kept() {
        assert_eq!(greedy_decode(&path(&[0, 0, 3, 3, 0, 3], 5)), vec![3, 3]);
    }

    #[test]
    fn immediate_repeats_collapse() {
        assert_eq!(greedy_decode(&path(&[2, 2, 2, 0, 2], 4)), vec![2, 2]);
    }

    #[test]
    fn non_adjacent_symbols_are_not_merged() {
        assert_eq!(greedy_decode(&path(&[1, 2, 1, 1, 2], 3)), vec![1, 2, 1, 2]);
    }

    #[test]
    fn all_blank_decodes_to_nothing() {
        assert!(greedy_decode(&path(&[0, 0, 0], 3)).is_empty());
    }

    #[test]
    fn ties_go_to_the_lowest_index() {
        assert_eq!(argmax(&[0.2, 0.7, 0.7, 0.1]), 1);
        assert_eq!(argmax(&[0.5, 0.5]), 0);

        let scores = ScoreMatrix::new(vec![0.1, 0.4, 0.4, 0.0, 0.4, 0.4], 2, 3).unwrap();
        assert_eq!(greedy_decode(&scores), vec![1]);
    }

    #[test]
    fn element_count_must_match_shape() {
        let error = ScoreMatrix::new(vec![0.0; 5], 2, 3).expect_err("5 != 2 * 3");
        assert!(matches!(
            error,
            SpeechError::DimensionMismatch {
                expected: 6,
                actual: 5,
                ..
            }
        ));
    }

    #[test]
    fn oversized_shape_is_a_mismatch() {
        let error = ScoreMatrix::new(Vec::new(), usize::MAX, 2).expect_err("shape overflows");
        assert!(matches!(
            error,
            SpeechError::DimensionMismatch {
                actual: usize::MAX,
                ..
            }
        ));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let rows = [vec![0.0f32, 1.0], vec![1.0f32]];
        assert!(ScoreMatrix::from_rows(&rows).is_err());
    }
}
