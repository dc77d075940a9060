//! ATR (Average True Range) with Wilder smoothing.
//!
//! TR = max(high - low, |high - prev_close|, |low - prev_close|); the first row, or a row
//! after a missing close, uses high - low. Seed = mean of the first n TRs,
//! then ATR = (ATR_prev * (n-1) + TR) / n.

use super::smoothed;
use crate::domain::cell::{Cell, Missing};
use crate::domain::ohlcv::true_range;

pub const DEFAULT_ATR_PERIOD: usize = 14;

pub fn calculate_atr(high: &[Cell], low: &[Cell], close: &[Cell], period: usize) -> Vec<Cell> {
    let ranges: Vec<Cell> = (0..high.len())
        .map(|t| {
            let prev_close = if t == 0 { Cell::Missing(Missing::Warmup) } else { close[t - 1] };
            true_range(high[t], low[t], prev_close)
        })
        .collect();
    smoothed(&ranges, period, 1.0 / period as f64)
}
