#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, Weekday};
use signalframe::domain::error::SignalframeError;
pub use signalframe::domain::ohlcv::OhlcvBar;
use signalframe::domain::plan::FeaturePlan;
use signalframe::domain::resample::MacroObservation;
use signalframe::domain::sentiment::Article;
use signalframe::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub macros: HashMap<String, Vec<MacroObservation>>,
    pub articles: Vec<Article>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            macros: HashMap::new(),
            articles: Vec::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_macro(mut self, name: &str, observations: Vec<MacroObservation>) -> Self {
        self.macros.insert(name.to_string(), observations);
        self
    }

    pub fn with_articles(mut self, articles: Vec<Article>) -> Self {
        self.articles = articles;
        self
    }

    pub fn with_error(mut self, name: &str, reason: &str) -> Self {
        self.errors.insert(name.to_string(), reason.to_string());
        self
    }

    fn check(&self, name: &str) -> Result<(), SignalframeError> {
        match self.errors.get(name) {
            Some(reason) => Err(SignalframeError::Data {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SignalframeError> {
        self.check(symbol)?;
        match self.data.get(symbol) {
            Some(bars) => Ok(bars
                .iter()
                .filter(|b| b.date >= start_date && b.date <= end_date)
                .cloned()
                .collect()),
            None => Err(SignalframeError::Data {
                reason: format!("no file for {}", symbol),
            }),
        }
    }

    fn fetch_macro(&self, name: &str) -> Result<Vec<MacroObservation>, SignalframeError> {
        self.check(name)?;
        self.macros.get(name).cloned().ok_or_else(|| SignalframeError::Data {
            reason: format!("no series {}", name),
        })
    }

    fn fetch_articles(&self) -> Result<Vec<Article>, SignalframeError> {
        self.check("articles")?;
        Ok(self.articles.clone())
    }

    fn list_symbols(&self) -> Result<Vec<String>, SignalframeError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(&self, symbol: &str) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SignalframeError> {
        self.check(symbol)?;
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn make_bar(symbol: &str, date: &str, close: f64) -> OhlcvBar {
    OhlcvBar::new(symbol, parse_date(date), close - 1.0, close + 1.0, close - 2.0, close, Some(1000.0))
}

/// Bars on consecutive weekdays starting at `start_date`, with closes from `closes`.
pub fn bars_from_closes(symbol: &str, start_date: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    let mut day = parse_date(start_date);
    closes
        .iter()
        .map(|&close| {
            while matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                day += chrono::Duration::days(1);
            }
            let bar = OhlcvBar::new(symbol, day, close * 0.995, close * 1.01, close * 0.99, close, Some(1_000_000.0));
            day += chrono::Duration::days(1);
            bar
        })
        .collect()
}

/// A deterministic wavy price path on weekdays.
pub fn generate_bars(symbol: &str, start_date: &str, count: usize, start_price: f64) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..count)
        .map(|i| start_price * (1.0 + 0.002 * i as f64 + 0.03 * ((i as f64) * 0.7).sin()))
        .collect();
    bars_from_closes(symbol, start_date, &closes)
}

pub fn observation(date: &str, value: f64) -> MacroObservation {
    MacroObservation {
        effective_date: parse_date(date),
        value: Some(value),
    }
}

pub fn article(date: &str, text: &str) -> Article {
    Article {
        date: parse_date(date),
        text: text.to_string(),
    }
}

/// Benchmark plus peers over 2024, short windows so every feature fills in quickly.
pub fn small_plan(peers: &[&str]) -> FeaturePlan {
    let mut plan = FeaturePlan::new("SPY", date(2024, 1, 1), date(2024, 12, 31));
    plan.peers = peers.iter().map(|p| p.to_string()).collect();
    plan.windows.returns = vec![3];
    plan.windows.rolling = vec![3];
    plan.windows.zscore = 10;
    plan.windows.correlation = 5;
    plan.windows.breadth = 3;
    plan.causality_samples = 4;
    plan
}
