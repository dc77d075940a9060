//! Loading every series a plan needs through the data port.
//!
//! The benchmark must load. Peers, macro series and the article feed that fail to
//! load are skipped with a warning so their columns surface as missing. Integrity
//! errors (duplicate or out-of-order dates) always abort.

use crate::domain::error::SignalframeError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::plan::FeaturePlan;
use crate::domain::resample::MacroSeries;
use crate::domain::sentiment::{ScoredArticle, score_articles};
use crate::ports::data_port::DataPort;
use crate::ports::sentiment_port::SentimentScorer;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

/// Already-fetched raw series, passed by value into the assembler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineInputs {
    pub benchmark: Vec<OhlcvBar>,
    pub peers: Vec<(String, Vec<OhlcvBar>)>,
    pub macros: Vec<MacroSeries>,
    pub sentiment: Vec<ScoredArticle>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedInput {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedInputs {
    pub inputs: PipelineInputs,
    pub skipped: Vec<SkippedInput>,
}

impl PipelineInputs {
    pub fn peer_bars(&self, symbol: &str) -> Option<&[OhlcvBar]> {
        self.peers
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, bars)| bars.as_slice())
    }

    pub fn macro_series(&self, name: &str) -> Option<&MacroSeries> {
        self.macros.iter().find(|m| m.name == name)
    }

    /// Everything dated on or before `through`, as a run ending that day would have seen it.
    pub fn truncated(&self, through: NaiveDate) -> Self {
        let cut = |bars: &[OhlcvBar]| -> Vec<OhlcvBar> { bars.iter().filter(|b| b.date <= through).cloned().collect() };
        Self {
            benchmark: cut(&self.benchmark),
            peers: self.peers.iter().map(|(s, bars)| (s.clone(), cut(bars))).collect(),
            macros: self.macros.iter().map(|m| m.truncated(through)).collect(),
            sentiment: self
                .sentiment
                .iter()
                .filter(|a| a.date <= through)
                .copied()
                .collect(),
        }
    }
}

pub fn load_inputs(
    plan: &FeaturePlan,
    data: &dyn DataPort,
    scorer: Option<&dyn SentimentScorer>,
) -> Result<LoadedInputs, SignalframeError> {
    let mut skipped = Vec::new();
    let mut skip = |name: &str, err: &SignalframeError| {
        warn!(input = %name, error = %err, "input unavailable, its columns will be missing");
        skipped.push(SkippedInput {
            name: name.to_string(),
            reason: err.to_string(),
        });
    };

    let benchmark = data.fetch_ohlcv(&plan.benchmark, plan.start_date, plan.end_date)?;
    if benchmark.is_empty() {
        return Err(SignalframeError::EmptyBenchmark {
            symbol: plan.benchmark.clone(),
        });
    }
    info!(symbol = %plan.benchmark, rows = benchmark.len(), "loaded benchmark");

    let mut peers = Vec::with_capacity(plan.peers.len());
    for symbol in &plan.peers {
        let bars = match data.fetch_ohlcv(symbol, plan.start_date, plan.end_date) {
            Ok(bars) => bars,
            Err(e) if e.is_integrity() => return Err(e),
            Err(e) => {
                skip(symbol, &e);
                Vec::new()
            }
        };
        debug!(symbol = %symbol, rows = bars.len(), "loaded peer");
        peers.push((symbol.clone(), bars));
    }

    let mut macros = Vec::with_capacity(plan.macros.len());
    for spec in &plan.macros {
        let observations = match data.fetch_macro(&spec.name) {
            Ok(obs) => obs
                .into_iter()
                .filter(|o| o.effective_date <= plan.end_date)
                .collect(),
            Err(e) if e.is_integrity() => return Err(e),
            Err(e) => {
                skip(&spec.name, &e);
                Vec::new()
            }
        };
        let series = MacroSeries::new(&spec.name, spec.frequency, spec.lag_days, observations)?;
        for (from, to) in series.stale_gaps() {
            warn!(
                series = %series.name,
                frequency = %series.frequency,
                from = %from,
                to = %to,
                "macro series gap exceeds twice its nominal period"
            );
        }
        debug!(series = %series.name, observations = series.observations().len(), lag_days = series.lag_days, "loaded macro series");
        macros.push(series);
    }

    let sentiment = match (plan.sentiment, scorer) {
        (None, _) => Vec::new(),
        (Some(_), None) => return Err(SignalframeError::config_missing("sentiment", "scores")),
        (Some(spec), Some(scorer)) => match data.fetch_articles() {
            Ok(articles) => {
                let articles: Vec<_> = articles.into_iter().filter(|a| a.date <= plan.end_date).collect();
                let scored = score_articles(&articles, scorer, spec.max_per_day);
                let failed = scored.iter().filter(|a| a.score.is_none()).count();
                info!(articles = articles.len(), scored = scored.len(), failed, "scored articles");
                scored
            }
            Err(e) if e.is_integrity() => return Err(e),
            Err(e) => {
                skip("articles", &e);
                Vec::new()
            }
        },
    };

    Ok(LoadedInputs {
        inputs: PipelineInputs {
            benchmark,
            peers,
            macros,
            sentiment,
        },
        skipped,
    })
}
