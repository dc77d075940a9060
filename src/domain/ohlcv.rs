//! OHLCV bar representation.
//!
//! Price fields are optional: a blank or unparseable field in the source file is
//! carried as `None` and surfaces as a `NoData` cell, never as a failed read.

use crate::domain::cell::Cell;
use chrono::NaiveDate;

/// One daily bar of one instrument. `date` is a calendar day, already normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl OhlcvBar {
    /// A bar with every price present.
    pub fn new(symbol: &str, date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: Option<f64>) -> Self {
        Self {
            symbol: symbol.to_string(),
            date,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume,
        }
    }

    /// (high - low) / close
    pub fn range_rel(&self) -> Cell {
        self.field(PriceField::High)
            .zip_with(self.field(PriceField::Low), |h, l| Cell::from_f64(h - l))
            .checked_div(self.field(PriceField::Close))
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|); plain high - low without a previous close.
    pub fn true_range(&self, prev_close: Option<f64>) -> Cell {
        true_range(
            self.field(PriceField::High),
            self.field(PriceField::Low),
            Cell::from_option(prev_close),
        )
    }

    pub fn field(&self, field: PriceField) -> Cell {
        let raw = match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
            PriceField::Volume => self.volume,
        };
        Cell::from_option(raw)
    }
}

/// True range over cells. A missing previous close falls back to the bar's own range;
/// a missing high or low makes the true range missing.
pub fn true_range(high: Cell, low: Cell, prev_close: Cell) -> Cell {
    high.zip_with(low, |h, l| {
        let hl = h - l;
        match prev_close {
            Cell::Value(pc) => Cell::from_f64(hl.max((h - pc).abs()).max((l - pc).abs())),
            Cell::Missing(_) => Cell::from_f64(hl),
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl PriceField {
    pub const ALL: [PriceField; 5] = [
        PriceField::Open,
        PriceField::High,
        PriceField::Low,
        PriceField::Close,
        PriceField::Volume,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceField::Open => "open",
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
            PriceField::Volume => "volume",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::Missing;

    fn sample_bar() -> OhlcvBar {
        OhlcvBar::new(
            "SPY",
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            100.0,
            110.0,
            90.0,
            105.0,
            Some(50_000.0),
        )
    }

    #[test]
    fn range_rel() {
        let bar = sample_bar();
        // (110 - 90) / 105
        let expected = 20.0 / 105.0;
        assert!((bar.range_rel().value().unwrap() - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn range_rel_zero_close() {
        let mut bar = sample_bar();
        bar.close = Some(0.0);
        assert_eq!(bar.range_rel(), Cell::Missing(Missing::ZeroDivision));
    }

    #[test]
    fn missing_volume_is_no_data() {
        let mut bar = sample_bar();
        bar.volume = None;
        assert_eq!(bar.field(PriceField::Volume), Cell::Missing(Missing::NoData));
        assert_eq!(bar.field(PriceField::Close), Cell::Value(105.0));
    }

    #[test]
    fn missing_close_only_affects_close_cells() {
        let mut bar = sample_bar();
        bar.close = None;
        assert_eq!(bar.field(PriceField::Close), Cell::Missing(Missing::NoData));
        assert_eq!(bar.field(PriceField::Open), Cell::Value(100.0));
        assert_eq!(bar.range_rel(), Cell::Missing(Missing::NoData));
        assert_eq!(bar.true_range(Some(100.0)), Cell::Value(20.0));
    }

    #[test]
    fn true_range_hl_dominates() {
        let bar = sample_bar();
        // high-low=20, |high-100|=10, |low-100|=10 → 20
        assert_eq!(bar.true_range(Some(100.0)), Cell::Value(20.0));
    }

    #[test]
    fn true_range_gap_up() {
        let bar = sample_bar();
        // high-low=20, |110-70|=40, |90-70|=20 → 40
        assert_eq!(bar.true_range(Some(70.0)), Cell::Value(40.0));
    }

    #[test]
    fn true_range_gap_down() {
        let bar = sample_bar();
        // high-low=20, |110-130|=20, |90-130|=40 → 40
        assert_eq!(bar.true_range(Some(130.0)), Cell::Value(40.0));
    }

    #[test]
    fn true_range_without_previous_close_is_range() {
        let bar = sample_bar();
        assert_eq!(bar.true_range(None), Cell::Value(20.0));

        let mut no_high = sample_bar();
        no_high.high = None;
        assert_eq!(no_high.true_range(Some(100.0)), Cell::Missing(Missing::NoData));
    }
}
