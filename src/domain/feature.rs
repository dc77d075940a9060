//! Feature column identity.
//!
//! - `FeatureKind`: what a column computes, with its parameters. Its `Display`
//!   is the column name written to the output table.
//! - `FeatureGroup`: the output category a column belongs to.

use crate::domain::indicator::IndicatorType;
use crate::domain::ohlcv::PriceField;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureGroup {
    Price,
    Return,
    Ratio,
    Macro,
    Sentiment,
    RollingStat,
    Indicator,
    Breadth,
    Target,
}

impl FeatureGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureGroup::Price => "price",
            FeatureGroup::Return => "return",
            FeatureGroup::Ratio => "ratio",
            FeatureGroup::Macro => "macro",
            FeatureGroup::Sentiment => "sentiment",
            FeatureGroup::RollingStat => "rolling_stat",
            FeatureGroup::Indicator => "indicator",
            FeatureGroup::Breadth => "breadth",
            FeatureGroup::Target => "target",
        }
    }

    /// Labels look forward by construction and are not features.
    pub fn is_label(&self) -> bool {
        matches!(self, FeatureGroup::Target)
    }
}

impl fmt::Display for FeatureGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Price { symbol: String, field: PriceField },
    RangeRel { symbol: String },
    Return { symbol: String, days: usize },
    LogReturn { symbol: String },
    OvernightReturn { symbol: String },
    IntradayReturn { symbol: String },
    Ratio { numerator: String, denominator: String },
    BasketReturn { basket: String },
    BasketSpread { long: String, short: String },
    Macro { name: String },
    MacroSpread { long: String, short: String },
    Sentiment,
    SentimentCount,
    Sma { source: Box<FeatureKind>, period: usize },
    ZScore { source: Box<FeatureKind>, period: usize },
    RealizedVol { symbol: String, period: usize },
    Skew { source: Box<FeatureKind>, period: usize },
    Kurtosis { source: Box<FeatureKind>, period: usize },
    Autocorr { source: Box<FeatureKind>, period: usize },
    Correlation { symbol: String, benchmark: String, period: usize },
    Indicator { symbol: String, indicator: IndicatorType },
    Breadth { period: usize },
    NextDayReturn { symbol: String },
}

impl FeatureKind {
    pub fn group(&self) -> FeatureGroup {
        match self {
            FeatureKind::Price { .. } | FeatureKind::RangeRel { .. } => FeatureGroup::Price,
            FeatureKind::Return { .. }
            | FeatureKind::LogReturn { .. }
            | FeatureKind::OvernightReturn { .. }
            | FeatureKind::IntradayReturn { .. } => FeatureGroup::Return,
            FeatureKind::Ratio { .. } | FeatureKind::BasketReturn { .. } | FeatureKind::BasketSpread { .. } => {
                FeatureGroup::Ratio
            }
            FeatureKind::Macro { .. } | FeatureKind::MacroSpread { .. } => FeatureGroup::Macro,
            FeatureKind::Sentiment | FeatureKind::SentimentCount => FeatureGroup::Sentiment,
            FeatureKind::Sma { .. }
            | FeatureKind::ZScore { .. }
            | FeatureKind::RealizedVol { .. }
            | FeatureKind::Skew { .. }
            | FeatureKind::Kurtosis { .. }
            | FeatureKind::Autocorr { .. }
            | FeatureKind::Correlation { .. } => FeatureGroup::RollingStat,
            FeatureKind::Indicator { indicator, .. } => indicator.group(),
            FeatureKind::Breadth { .. } => FeatureGroup::Breadth,
            FeatureKind::NextDayReturn { .. } => FeatureGroup::Target,
        }
    }

    pub fn sma(source: FeatureKind, period: usize) -> Self {
        FeatureKind::Sma {
            source: Box::new(source),
            period,
        }
    }

    pub fn zscore(source: FeatureKind, period: usize) -> Self {
        FeatureKind::ZScore {
            source: Box::new(source),
            period,
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKind::Price { symbol, field } => write!(f, "{}_{}", symbol, field.as_str()),
            FeatureKind::RangeRel { symbol } => write!(f, "{}_range_rel", symbol),
            FeatureKind::Return { symbol, days } => write!(f, "{}_ret_{}", symbol, days),
            FeatureKind::LogReturn { symbol } => write!(f, "{}_logret", symbol),
            FeatureKind::OvernightReturn { symbol } => write!(f, "{}_overnight_ret", symbol),
            FeatureKind::IntradayReturn { symbol } => write!(f, "{}_intraday_ret", symbol),
            FeatureKind::Ratio {
                numerator,
                denominator,
            } => write!(f, "ratio_{}_{}", numerator, denominator),
            FeatureKind::BasketReturn { basket } => write!(f, "basket_{}_ret", basket),
            FeatureKind::BasketSpread { long, short } => write!(f, "basket_{}_minus_{}", long, short),
            FeatureKind::Macro { name } => write!(f, "macro_{}", name),
            FeatureKind::MacroSpread { long, short } => write!(f, "spread_{}_{}", long, short),
            FeatureKind::Sentiment => write!(f, "sentiment_mean"),
            FeatureKind::SentimentCount => write!(f, "sentiment_count"),
            FeatureKind::Sma { source, period } => write!(f, "{}_sma_{}", source, period),
            FeatureKind::ZScore { source, period } => write!(f, "{}_z_{}", source, period),
            FeatureKind::RealizedVol { symbol, period } => write!(f, "{}_rvol_{}", symbol, period),
            FeatureKind::Skew { source, period } => write!(f, "{}_skew_{}", source, period),
            FeatureKind::Kurtosis { source, period } => write!(f, "{}_kurt_{}", source, period),
            FeatureKind::Autocorr { source, period } => write!(f, "{}_autocorr_{}", source, period),
            FeatureKind::Indicator { symbol, indicator } => write!(f, "{}_{}", symbol, indicator),
            FeatureKind::Correlation {
                symbol,
                benchmark,
                period,
            } => write!(f, "corr_{}_{}_{}", symbol, benchmark, period),
            FeatureKind::Breadth { period } => write!(f, "breadth_{}", period),
            FeatureKind::NextDayReturn { symbol } => write!(f, "target_{}_next_ret", symbol),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names() {
        let close = FeatureKind::Price {
            symbol: "SPY".into(),
            field: PriceField::Close,
        };
        assert_eq!(close.to_string(), "SPY_close");
        assert_eq!(FeatureKind::sma(close.clone(), 20).to_string(), "SPY_close_sma_20");
        assert_eq!(
            FeatureKind::Return {
                symbol: "SPY".into(),
                days: 5
            }
            .to_string(),
            "SPY_ret_5"
        );
        assert_eq!(
            FeatureKind::Ratio {
                numerator: "XLK".into(),
                denominator: "XLU".into()
            }
            .to_string(),
            "ratio_XLK_XLU"
        );
        assert_eq!(FeatureKind::Breadth { period: 20 }.to_string(), "breadth_20");
        let logret = FeatureKind::LogReturn { symbol: "SPY".into() };
        assert_eq!(
            FeatureKind::Skew {
                source: Box::new(logret),
                period: 20
            }
            .to_string(),
            "SPY_logret_skew_20"
        );
        assert_eq!(
            FeatureKind::Indicator {
                symbol: "SPY".into(),
                indicator: IndicatorType::Rsi(14)
            }
            .to_string(),
            "SPY_rsi_14"
        );
    }

    #[test]
    fn groups() {
        let logret = FeatureKind::LogReturn { symbol: "SPY".into() };
        assert_eq!(logret.group(), FeatureGroup::Return);
        assert_eq!(FeatureKind::zscore(logret, 20).group(), FeatureGroup::RollingStat);
        assert_eq!(
            FeatureKind::MacroSpread {
                long: "DGS10".into(),
                short: "DGS2".into()
            }
            .group(),
            FeatureGroup::Macro
        );
        let target = FeatureKind::NextDayReturn { symbol: "SPY".into() };
        assert!(target.group().is_label());
        assert!(!FeatureGroup::Breadth.is_label());

        let indicator = |indicator| FeatureKind::Indicator {
            symbol: "SPY".into(),
            indicator,
        };
        assert_eq!(indicator(IndicatorType::Atr(14)).group(), FeatureGroup::Indicator);
        assert_eq!(indicator(IndicatorType::Parkinson(20)).group(), FeatureGroup::RollingStat);
    }

    #[test]
    fn group_order_follows_output_layout() {
        assert!(FeatureGroup::Price < FeatureGroup::Return);
        assert!(FeatureGroup::RollingStat < FeatureGroup::Indicator);
        assert!(FeatureGroup::Indicator < FeatureGroup::Breadth);
        assert!(FeatureGroup::RollingStat < FeatureGroup::Target);
    }
}
