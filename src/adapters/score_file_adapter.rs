//! Sentiment scorer backed by an offline model's output file.
//!
//! The file is a CSV of `text,score` written by the external model. A blank score
//! records a failed scoring; text the file does not cover is also a failure.

use crate::domain::error::SignalframeError;
use crate::ports::sentiment_port::SentimentScorer;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct ScoreRecord {
    text: String,
    score: Option<f64>,
}

#[derive(Debug, Default)]
pub struct ScoreFileAdapter {
    scores: HashMap<String, Option<f64>>,
}

impl ScoreFileAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SignalframeError> {
        let path = path.as_ref();
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| SignalframeError::Data {
                reason: format!("failed to read {}: {}", path.display(), e),
            })?;

        let mut scores = HashMap::new();
        for result in rdr.deserialize::<ScoreRecord>() {
            let record = result.map_err(|e| SignalframeError::Data {
                reason: format!("{}: {}", path.display(), e),
            })?;
            scores.insert(record.text, record.score);
        }
        Ok(Self { scores })
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Option<f64>)>,
        S: Into<String>,
    {
        Self {
            scores: pairs.into_iter().map(|(t, s)| (t.into(), s)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl SentimentScorer for ScoreFileAdapter {
    fn score(&self, text: &str) -> Result<f64, SignalframeError> {
        match self.scores.get(text.trim()) {
            Some(Some(score)) => Ok(*score),
            Some(None) => Err(SignalframeError::Scorer {
                reason: "model reported no score".into(),
            }),
            None => Err(SignalframeError::Scorer {
                reason: "article not in score file".into(),
            }),
        }
    }
}
