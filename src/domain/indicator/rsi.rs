//! RSI (Relative Strength Index).
//!
//! Uses Wilder's smoothing for average gain/loss:
//! - First average: simple mean of gains/losses over the first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100, unless avg_gain is also 0 (flat window, `ZeroDivision`).
//!
//! Warmup: first n rows (n price changes are needed for the first average).

use super::{changes, smoothed};
use crate::domain::cell::{Cell, Missing};

pub const DEFAULT_RSI_PERIOD: usize = 14;

pub fn calculate_rsi(close: &[Cell], period: usize) -> Vec<Cell> {
    let diffs = changes(close);
    let gains: Vec<Cell> = diffs.iter().map(|d| d.map(|x| x.max(0.0))).collect();
    let losses: Vec<Cell> = diffs.iter().map(|d| d.map(|x| (-x).max(0.0))).collect();

    let alpha = 1.0 / period as f64;
    let avg_gain = smoothed(&gains, period, alpha);
    let avg_loss = smoothed(&losses, period, alpha);

    avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(&g, &l)| {
            g.zip_with(l, |g, l| {
                if l == 0.0 && g == 0.0 {
                    Cell::Missing(Missing::ZeroDivision)
                } else if l == 0.0 {
                    Cell::Value(100.0)
                } else {
                    Cell::from_f64(100.0 - 100.0 / (1.0 + g / l))
                }
            })
        })
        .collect()
}
