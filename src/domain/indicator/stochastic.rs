//! Stochastic oscillator.
//!
//! %K = 100 * (close - lowest low) / (highest high - lowest low) over k rows;
//! %D = simple mean of %K over d rows. A window with no range is `ZeroDivision`.

use crate::domain::cell::{Cell, Missing};
use crate::domain::rolling::{per_row, rolling_mean, trailing_window};

pub const DEFAULT_K_PERIOD: usize = 14;
pub const DEFAULT_D_PERIOD: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticColumns {
    pub k: Vec<Cell>,
    pub d: Vec<Cell>,
}

pub fn calculate_stochastic(
    high: &[Cell],
    low: &[Cell],
    close: &[Cell],
    k_period: usize,
    d_period: usize,
) -> StochasticColumns {
    let k = per_row(close.len(), |t| {
        let highs = trailing_window(high, t, k_period)?;
        let lows = trailing_window(low, t, k_period)?;
        let c = close[t].to_result()?;
        let hh = highs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let ll = lows.iter().copied().fold(f64::INFINITY, f64::min);
        if hh - ll <= 0.0 {
            return Err(Missing::ZeroDivision);
        }
        Ok(100.0 * (c - ll) / (hh - ll))
    });
    let d = rolling_mean(&k, d_period);
    StochasticColumns { k, d }
}
