//! Canonical trading-day index and exact reindexing of secondary series.
//!
//! The benchmark's own dates define the index. Every other instrument is joined
//! onto it exactly: a benchmark date the instrument lacks becomes a `NoData`
//! cell. Prices are never interpolated or forward-filled here.

use crate::domain::cell::{Cell, Missing};
use crate::domain::error::SignalframeError;
use crate::domain::ohlcv::{OhlcvBar, PriceField};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt::Display;
use std::hash::Hash;

/// Ordered, immutable set of trading days every column is keyed by.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalIndex {
    dates: Vec<NaiveDate>,
    positions: HashMap<NaiveDate, usize>,
}

impl CanonicalIndex {
    /// Builds the index from the benchmark's bars, which must be strictly increasing.
    pub fn from_benchmark(bars: &[OhlcvBar]) -> Result<Self, SignalframeError> {
        let series = bars
            .first()
            .map(|b| b.symbol.clone())
            .unwrap_or_else(|| "benchmark".to_string());
        Self::from_dates(&series, bars.iter().map(|b| b.date).collect())
    }

    pub fn from_dates(series: &str, dates: Vec<NaiveDate>) -> Result<Self, SignalframeError> {
        for pair in dates.windows(2) {
            if pair[1] == pair[0] {
                return Err(SignalframeError::DuplicateDate {
                    series: series.to_string(),
                    date: pair[1].to_string(),
                });
            }
            if pair[1] < pair[0] {
                return Err(SignalframeError::NonMonotonicDates {
                    series: series.to_string(),
                    previous: pair[0],
                    current: pair[1],
                });
            }
        }
        let positions = dates.iter().enumerate().map(|(i, &d)| (d, i)).collect();
        Ok(Self { dates, positions })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.positions.get(&date).copied()
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }
}

/// Exact join of `(key, value)` points onto `index`.
///
/// Output has one cell per index key, in index order. Keys absent from `points`
/// yield `Missing::NoData`; keys in `points` but not in `index` are dropped.
/// A key appearing twice in `points` is an ambiguous record.
pub fn reindex<K>(series: &str, points: &[(K, Cell)], index: &[K]) -> Result<Vec<Cell>, SignalframeError>
where
    K: Copy + Eq + Hash + Display,
{
    let mut by_key: HashMap<K, Cell> = HashMap::with_capacity(points.len());
    for &(key, cell) in points {
        match by_key.entry(key) {
            Entry::Occupied(_) => {
                return Err(SignalframeError::DuplicateDate {
                    series: series.to_string(),
                    date: key.to_string(),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(cell);
            }
        }
    }

    Ok(index
        .iter()
        .map(|k| {
            by_key
                .get(k)
                .copied()
                .unwrap_or(Cell::Missing(Missing::NoData))
        })
        .collect())
}

/// One instrument's OHLCV fields laid onto the canonical index.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedInstrument {
    pub symbol: String,
    pub open: Vec<Cell>,
    pub high: Vec<Cell>,
    pub low: Vec<Cell>,
    pub close: Vec<Cell>,
    pub volume: Vec<Cell>,
}

impl AlignedInstrument {
    pub fn field(&self, field: PriceField) -> &[Cell] {
        match field {
            PriceField::Open => &self.open,
            PriceField::High => &self.high,
            PriceField::Low => &self.low,
            PriceField::Close => &self.close,
            PriceField::Volume => &self.volume,
        }
    }

    /// Number of canonical dates this instrument has no close for.
    pub fn gap_count(&self) -> usize {
        self.close.iter().filter(|c| c.is_missing()).count()
    }
}

pub fn align_instrument(
    symbol: &str,
    bars: &[OhlcvBar],
    index: &CanonicalIndex,
) -> Result<AlignedInstrument, SignalframeError> {
    let column = |field: PriceField| -> Result<Vec<Cell>, SignalframeError> {
        let points: Vec<(NaiveDate, Cell)> = bars.iter().map(|b| (b.date, b.field(field))).collect();
        reindex(symbol, &points, index.dates())
    };

    Ok(AlignedInstrument {
        symbol: symbol.to_string(),
        open: column(PriceField::Open)?,
        high: column(PriceField::High)?,
        low: column(PriceField::Low)?,
        close: column(PriceField::Close)?,
        volume: column(PriceField::Volume)?,
    })
}

/// Parses `+HH:MM` / `-HH:MM` (or `Z`) into a fixed offset.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let s = raw.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

const ZONED_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%z"];
const NAIVE_DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Truncates a raw timestamp to its calendar day in `offset`.
///
/// Zoned timestamps are converted to `offset` first; naive ones are taken as
/// already local.
pub fn normalize_timestamp(raw: &str, offset: FixedOffset) -> Result<NaiveDate, SignalframeError> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&offset).date_naive());
    }
    for fmt in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.with_timezone(&offset).date_naive());
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }

    Err(SignalframeError::InvalidTimestamp {
        value: raw.to_string(),
        reason: "unrecognized date/time format".into(),
    })
}
