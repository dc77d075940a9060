//! Aggregation of externally scored news articles into daily sentiment columns.
//!
//! Scoring itself belongs to a [`SentimentScorer`] collaborator. Here we only cap
//! articles per day, apply the failure policy, and attribute each article to the
//! first canonical date on which it is visible under the reporting lag.

use crate::domain::cell::{Cell, Missing};
use crate::ports::sentiment_port::SentimentScorer;
use chrono::{Days, NaiveDate};
use std::collections::HashMap;
use tracing::warn;

pub const DEFAULT_MAX_PER_DAY: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub date: NaiveDate,
    pub text: String,
}

/// `score` is `None` when the scorer failed on this article.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredArticle {
    pub date: NaiveDate,
    pub score: Option<f64>,
}

/// Scores at most `max_per_day` articles per calendar day, in input order.
///
/// Empty text is neutral (0). A scorer error, or a score outside [-1, 1], leaves
/// that article unscored without failing the batch.
pub fn score_articles(
    articles: &[Article],
    scorer: &dyn SentimentScorer,
    max_per_day: usize,
) -> Vec<ScoredArticle> {
    let mut per_day: HashMap<NaiveDate, usize> = HashMap::new();
    let mut scored = Vec::with_capacity(articles.len());

    for article in articles {
        let seen = per_day.entry(article.date).or_insert(0);
        if *seen >= max_per_day {
            continue;
        }
        *seen += 1;

        let text = article.text.trim();
        let score = if text.is_empty() {
            Some(0.0)
        } else {
            match scorer.score(text) {
                Ok(s) if s.is_finite() && (-1.0..=1.0).contains(&s) => Some(s),
                Ok(s) => {
                    warn!(date = %article.date, score = s, "sentiment score out of range, dropping");
                    None
                }
                Err(e) => {
                    warn!(date = %article.date, error = %e, "sentiment scorer failed");
                    None
                }
            }
        };
        scored.push(ScoredArticle {
            date: article.date,
            score,
        });
    }

    scored
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentimentColumns {
    pub mean: Vec<Cell>,
    pub count: Vec<Cell>,
}

/// Buckets articles onto `index` (sorted ascending).
///
/// Row i collects articles dated in `(index[i-1] - lag, index[i] - lag]`, so news
/// from non-trading days lands on the next trading day after its lag. Rows with
/// no articles are `NoData`; rows whose articles all failed are `ScorerFailure`.
pub fn sentiment_as_of(scored: &[ScoredArticle], index: &[NaiveDate], lag_days: u32) -> SentimentColumns {
    let lag = Days::new(u64::from(lag_days));
    let mut sorted: Vec<ScoredArticle> = scored.to_vec();
    sorted.sort_by_key(|a| a.date);

    let mut mean = Vec::with_capacity(index.len());
    let mut count = Vec::with_capacity(index.len());
    let mut next = 0;
    let mut previous_cutoff: Option<NaiveDate> = None;

    for &date in index {
        let Some(cutoff) = date.checked_sub_days(lag) else {
            mean.push(Cell::Missing(Missing::NoData));
            count.push(Cell::Value(0.0));
            continue;
        };
        let lower = previous_cutoff.or_else(|| cutoff.checked_sub_days(Days::new(1)));
        while next < sorted.len() && lower.is_some_and(|l| sorted[next].date <= l) {
            next += 1;
        }

        let mut sum = 0.0;
        let mut scored_n = 0usize;
        let mut bucket_n = 0usize;
        while next < sorted.len() && sorted[next].date <= cutoff {
            bucket_n += 1;
            if let Some(s) = sorted[next].score {
                sum += s;
                scored_n += 1;
            }
            next += 1;
        }

        mean.push(match (bucket_n, scored_n) {
            (0, _) => Cell::Missing(Missing::NoData),
            (_, 0) => Cell::Missing(Missing::ScorerFailure),
            (_, n) => Cell::from_f64(sum / n as f64),
        });
        count.push(Cell::Value(scored_n as f64));
        previous_cutoff = Some(cutoff);
    }

    SentimentColumns { mean, count }
}
