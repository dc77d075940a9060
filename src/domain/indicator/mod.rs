//! Technical indicators over aligned cell columns.
//!
//! This module provides:
//! - `IndicatorType`: indicator identity + parameters; its `Display` is the column suffix
//! - `IndicatorSpec`: the configured periods
//! - `compute_indicators`: every indicator column for one instrument
//!
//! Recursive averages (EMA, Wilder) seed with the mean of their first full window and
//! restart after a gap. Windowed indicators follow the rolling engine: a row needs all W
//! cells present, and is `Warmup` for t < W-1.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod extremes;
pub mod gaps;
pub mod liquidity;
pub mod macd;
pub mod obv;
pub mod range_volatility;
pub mod rsi;
pub mod stochastic;

use crate::domain::calendar::AlignedInstrument;
use crate::domain::cell::{Cell, Missing};
use crate::domain::feature::FeatureGroup;
use crate::domain::rolling::{StdKind, mean, rolling_mean, trailing_window};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacdLine {
    Line,
    Signal,
    Histogram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BollingerBand {
    Upper,
    Lower,
    /// (upper - lower) / middle
    Width,
    /// (close - lower) / (upper - lower)
    PercentB,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Ema(usize),
    EmaDistance(usize),
    SmaDistance(usize),
    Macd(MacdLine),
    Rsi(usize),
    StochasticK(usize),
    StochasticD(usize),
    Bollinger { band: BollingerBand, period: usize },
    Atr(usize),
    Obv,
    Parkinson(usize),
    GarmanKlass(usize),
    RogersSatchell(usize),
    Amihud(usize),
    RollSpread(usize),
    VolumePercentile(usize),
    VolumeRatio(usize),
    DaysSinceHigh(usize),
    DaysSinceLow(usize),
    GapFill(usize),
}

impl IndicatorType {
    /// Range-based volatility estimators sit with the other rolling statistics.
    pub fn group(&self) -> FeatureGroup {
        match self {
            IndicatorType::Parkinson(_) | IndicatorType::GarmanKlass(_) | IndicatorType::RogersSatchell(_) => {
                FeatureGroup::RollingStat
            }
            _ => FeatureGroup::Indicator,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Ema(p) => write!(f, "ema_{}", p),
            IndicatorType::EmaDistance(p) => write!(f, "dist_ema_{}", p),
            IndicatorType::SmaDistance(p) => write!(f, "dist_sma_{}", p),
            IndicatorType::Macd(MacdLine::Line) => write!(f, "macd"),
            IndicatorType::Macd(MacdLine::Signal) => write!(f, "macd_signal"),
            IndicatorType::Macd(MacdLine::Histogram) => write!(f, "macd_hist"),
            IndicatorType::Rsi(p) => write!(f, "rsi_{}", p),
            IndicatorType::StochasticK(p) => write!(f, "stoch_k_{}", p),
            IndicatorType::StochasticD(p) => write!(f, "stoch_d_{}", p),
            IndicatorType::Bollinger { band, period } => {
                let name = match band {
                    BollingerBand::Upper => "upper",
                    BollingerBand::Lower => "lower",
                    BollingerBand::Width => "width",
                    BollingerBand::PercentB => "pctb",
                };
                write!(f, "bb_{}_{}", name, period)
            }
            IndicatorType::Atr(p) => write!(f, "atr_{}", p),
            IndicatorType::Obv => write!(f, "obv"),
            IndicatorType::Parkinson(p) => write!(f, "parkinson_{}", p),
            IndicatorType::GarmanKlass(p) => write!(f, "gk_{}", p),
            IndicatorType::RogersSatchell(p) => write!(f, "rs_{}", p),
            IndicatorType::Amihud(p) => write!(f, "amihud_{}", p),
            IndicatorType::RollSpread(p) => write!(f, "roll_spread_{}", p),
            IndicatorType::VolumePercentile(p) => write!(f, "volume_pct_{}", p),
            IndicatorType::VolumeRatio(p) => write!(f, "volume_ratio_{}", p),
            IndicatorType::DaysSinceHigh(p) => write!(f, "days_since_high_{}", p),
            IndicatorType::DaysSinceLow(p) => write!(f, "days_since_low_{}", p),
            IndicatorType::GapFill(p) => write!(f, "gap_fill_{}", p),
        }
    }
}

/// Periods for the `[indicators]` family.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSpec {
    pub ema: Vec<usize>,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub rsi: usize,
    pub stochastic_k: usize,
    pub stochastic_d: usize,
    pub bollinger: usize,
    pub bollinger_std: f64,
    pub atr: usize,
}

impl Default for IndicatorSpec {
    fn default() -> Self {
        Self {
            ema: ema::DEFAULT_EMA_PERIODS.to_vec(),
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            rsi: rsi::DEFAULT_RSI_PERIOD,
            stochastic_k: stochastic::DEFAULT_K_PERIOD,
            stochastic_d: stochastic::DEFAULT_D_PERIOD,
            bollinger: bollinger::DEFAULT_PERIOD,
            bollinger_std: bollinger::DEFAULT_MULTIPLIER,
            atr: atr::DEFAULT_ATR_PERIOD,
        }
    }
}

/// Exponential smoothing with factor `alpha`.
///
/// Seed: mean of the first `period` consecutive present values.
/// Then s[t] = x[t] * alpha + s[t-1] * (1 - alpha).
/// A gap is emitted with its reason and drops the state; the next seed needs a fresh full window.
pub(crate) fn smoothed(values: &[Cell], period: usize, alpha: f64) -> Vec<Cell> {
    let mut state: Option<f64> = None;
    (0..values.len())
        .map(|t| match values[t] {
            Cell::Missing(reason) => {
                state = None;
                Cell::Missing(reason)
            }
            Cell::Value(x) => {
                let next = match state {
                    Some(prev) => x * alpha + prev * (1.0 - alpha),
                    None => match trailing_window(values, t, period) {
                        Ok(w) => mean(&w),
                        Err(reason) => return Cell::Missing(reason),
                    },
                };
                state = Some(next);
                Cell::from_f64(next)
            }
        })
        .collect()
}

/// x[t] - x[t-1]; the first row is `Warmup`.
pub(crate) fn changes(values: &[Cell]) -> Vec<Cell> {
    (0..values.len())
        .map(|t| {
            if t == 0 {
                Cell::Missing(Missing::Warmup)
            } else {
                values[t].zip_with(values[t - 1], |cur, prev| Cell::from_f64(cur - prev))
            }
        })
        .collect()
}

/// Every indicator column for one instrument: the `spec` periods, plus one set per
/// `rolling` window for the distance, range-volatility, liquidity, extreme and gap families.
pub fn compute_indicators(
    bars: &AlignedInstrument,
    spec: &IndicatorSpec,
    rolling: &[usize],
    std_kind: StdKind,
) -> Vec<(IndicatorType, Vec<Cell>)> {
    let mut out = Vec::new();

    for &period in &spec.ema {
        let average = ema::calculate_ema(&bars.close, period);
        let distance = ema::distance_from_average(&bars.close, &average);
        out.push((IndicatorType::Ema(period), average));
        out.push((IndicatorType::EmaDistance(period), distance));
    }

    let macd = macd::calculate_macd(&bars.close, spec.macd_fast, spec.macd_slow, spec.macd_signal);
    out.push((IndicatorType::Macd(MacdLine::Line), macd.line));
    out.push((IndicatorType::Macd(MacdLine::Signal), macd.signal));
    out.push((IndicatorType::Macd(MacdLine::Histogram), macd.histogram));

    out.push((IndicatorType::Rsi(spec.rsi), rsi::calculate_rsi(&bars.close, spec.rsi)));

    let stoch = stochastic::calculate_stochastic(
        &bars.high,
        &bars.low,
        &bars.close,
        spec.stochastic_k,
        spec.stochastic_d,
    );
    out.push((IndicatorType::StochasticK(spec.stochastic_k), stoch.k));
    out.push((IndicatorType::StochasticD(spec.stochastic_d), stoch.d));

    let bands = bollinger::calculate_bollinger(&bars.close, spec.bollinger, spec.bollinger_std);
    let period = spec.bollinger;
    out.push((IndicatorType::Bollinger { band: BollingerBand::Upper, period }, bands.upper));
    out.push((IndicatorType::Bollinger { band: BollingerBand::Lower, period }, bands.lower));
    out.push((IndicatorType::Bollinger { band: BollingerBand::Width, period }, bands.width));
    out.push((IndicatorType::Bollinger { band: BollingerBand::PercentB, period }, bands.percent_b));

    out.push((
        IndicatorType::Atr(spec.atr),
        atr::calculate_atr(&bars.high, &bars.low, &bars.close, spec.atr),
    ));
    out.push((IndicatorType::Obv, obv::calculate_obv(&bars.close, &bars.volume)));

    for &window in rolling {
        let sma = rolling_mean(&bars.close, window);
        out.push((
            IndicatorType::SmaDistance(window),
            ema::distance_from_average(&bars.close, &sma),
        ));
        out.push((
            IndicatorType::Parkinson(window),
            range_volatility::parkinson(&bars.high, &bars.low, window),
        ));
        out.push((
            IndicatorType::GarmanKlass(window),
            range_volatility::garman_klass(&bars.open, &bars.high, &bars.low, &bars.close, window),
        ));
        out.push((
            IndicatorType::RogersSatchell(window),
            range_volatility::rogers_satchell(&bars.open, &bars.high, &bars.low, &bars.close, window),
        ));
        out.push((
            IndicatorType::Amihud(window),
            liquidity::amihud_illiquidity(&bars.close, &bars.volume, window),
        ));
        out.push((
            IndicatorType::RollSpread(window),
            liquidity::roll_spread(&bars.close, window, std_kind),
        ));
        out.push((
            IndicatorType::VolumePercentile(window),
            liquidity::volume_percentile(&bars.volume, window),
        ));
        out.push((
            IndicatorType::VolumeRatio(window),
            liquidity::volume_ratio(&bars.volume, window),
        ));
        out.push((
            IndicatorType::DaysSinceHigh(window),
            extremes::days_since_high(&bars.high, window),
        ));
        out.push((
            IndicatorType::DaysSinceLow(window),
            extremes::days_since_low(&bars.low, window),
        ));
        out.push((
            IndicatorType::GapFill(window),
            gaps::gap_fill_rate(&bars.open, &bars.high, &bars.low, &bars.close, window),
        ));
    }

    out
}
