//! Sentiment scorer port.

use crate::domain::error::SignalframeError;

/// Maps article text to a sentiment in [-1, 1]. Implemented outside the core.
pub trait SentimentScorer {
    fn score(&self, text: &str) -> Result<f64, SignalframeError>;
}
