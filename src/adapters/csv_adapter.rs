//! CSV directory data adapter.
//!
//! Layout under `base_path`:
//! - `<SYMBOL>.csv`: `date,open,high,low,close[,volume]` (extra columns ignored);
//!   a blank, `null`, `NaN` or unparseable price is read as a gap, not an error
//! - `macro/<NAME>.csv`: two columns, date then value; blank or `.` is a gap
//! - an optional article file with `date` and `text` columns
//!
//! Timestamps are normalized to calendar days in the configured UTC offset.
//! Records are returned in file order; ordering and duplicates are checked by the domain.

use crate::domain::calendar::normalize_timestamp;
use crate::domain::error::SignalframeError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::resample::MacroObservation;
use crate::domain::sentiment::Article;
use crate::ports::data_port::DataPort;
use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Field contents read as "no value" in price and macro files.
const GAP_TOKENS: [&str; 7] = ["", ".", "null", "nan", "na", "n/a", "none"];

#[derive(Debug, Deserialize)]
struct RawBar {
    #[serde(alias = "Date", alias = "timestamp", alias = "Datetime")]
    date: String,
    #[serde(alias = "Open", deserialize_with = "lenient_number")]
    open: Option<f64>,
    #[serde(alias = "High", deserialize_with = "lenient_number")]
    high: Option<f64>,
    #[serde(alias = "Low", deserialize_with = "lenient_number")]
    low: Option<f64>,
    #[serde(alias = "Close", deserialize_with = "lenient_number")]
    close: Option<f64>,
    #[serde(alias = "Volume", default, deserialize_with = "lenient_number")]
    volume: Option<f64>,
}

impl RawBar {
    fn has_price_gap(&self) -> bool {
        [self.open, self.high, self.low, self.close].iter().any(Option::is_none)
    }
}

/// Parses a numeric field; gap tokens and non-finite numbers are `None`.
fn parse_number(raw: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    let trimmed = raw.trim();
    if GAP_TOKENS.iter().any(|token| trimmed.eq_ignore_ascii_case(token)) {
        return Ok(None);
    }
    trimmed.parse::<f64>().map(|v| v.is_finite().then_some(v))
}

/// Coerces anything that is not a finite number to `None`.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(|s| parse_number(s).ok().flatten()))
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    #[serde(alias = "Date", alias = "timestamp", alias = "published")]
    date: String,
    #[serde(alias = "Text", alias = "content", default)]
    text: String,
}

pub struct CsvAdapter {
    base_path: PathBuf,
    articles_path: Option<PathBuf>,
    offset: FixedOffset,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            articles_path: None,
            offset: Utc.fix(),
        }
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_articles(mut self, path: PathBuf) -> Self {
        self.articles_path = Some(path);
        self
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn macro_path(&self, name: &str) -> PathBuf {
        self.base_path.join("macro").join(format!("{}.csv", name))
    }

    fn read_bars(&self, symbol: &str) -> Result<Vec<OhlcvBar>, SignalframeError> {
        let path = self.csv_path(symbol);
        let mut rdr = open_reader(&path)?;
        let mut bars = Vec::new();
        let mut gap_rows = 0usize;

        for result in rdr.deserialize::<RawBar>() {
            let raw = result.map_err(|e| data_error(&path, e))?;
            if raw.has_price_gap() {
                gap_rows += 1;
            }
            bars.push(OhlcvBar {
                symbol: symbol.to_string(),
                date: normalize_timestamp(&raw.date, self.offset)?,
                open: raw.open,
                high: raw.high,
                low: raw.low,
                close: raw.close,
                volume: raw.volume,
            });
        }
        if gap_rows > 0 {
            warn!(symbol = %symbol, rows = gap_rows, "blank or unparseable price fields read as gaps");
        }
        Ok(bars)
    }
}

fn open_reader(path: &Path) -> Result<csv::Reader<fs::File>, SignalframeError> {
    let file = fs::File::open(path).map_err(|e| SignalframeError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;
    Ok(csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file))
}

fn data_error(path: &Path, err: impl std::fmt::Display) -> SignalframeError {
    SignalframeError::Data {
        reason: format!("{}: {}", path.display(), err),
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SignalframeError> {
        Ok(self
            .read_bars(symbol)?
            .into_iter()
            .filter(|b| b.date >= start_date && b.date <= end_date)
            .collect())
    }

    fn fetch_macro(&self, name: &str) -> Result<Vec<MacroObservation>, SignalframeError> {
        let path = self.macro_path(name);
        let mut rdr = open_reader(&path)?;
        let mut observations = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| data_error(&path, e))?;
            let date_str = record
                .get(0)
                .ok_or_else(|| data_error(&path, "missing date column"))?;
            let raw_value = record.get(1).unwrap_or("");
            let value = parse_number(raw_value)
                .map_err(|e| data_error(&path, format!("invalid value {:?}: {}", raw_value, e)))?;
            observations.push(MacroObservation {
                effective_date: normalize_timestamp(date_str, self.offset)?,
                value,
            });
        }
        Ok(observations)
    }

    fn fetch_articles(&self) -> Result<Vec<Article>, SignalframeError> {
        let Some(path) = &self.articles_path else {
            return Ok(Vec::new());
        };
        let mut rdr = open_reader(path)?;
        let mut articles = Vec::new();

        for result in rdr.deserialize::<RawArticle>() {
            let raw = result.map_err(|e| data_error(path, e))?;
            articles.push(Article {
                date: normalize_timestamp(&raw.date, self.offset)?,
                text: raw.text,
            });
        }
        Ok(articles)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SignalframeError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SignalframeError::Data {
            reason: format!("failed to read directory {}: {}", self.base_path.display(), e),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(&self, symbol: &str) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SignalframeError> {
        let bars = self.read_bars(symbol)?;
        let first = bars.iter().map(|b| b.date).min();
        let last = bars.iter().map(|b| b.date).max();
        Ok(first.zip(last).map(|(f, l)| (f, l, bars.len())))
    }
}
