//! Liquidity measures over a trailing window.

use super::changes;
use crate::domain::cell::{Cell, Missing};
use crate::domain::returns::calculate_returns;
use crate::domain::rolling::{StdKind, lagged, mean, per_row, rolling_mean, trailing_window};

/// Amihud illiquidity: mean of |daily return| / (close * volume). Zero dollar volume is `ZeroDivision`.
pub fn amihud_illiquidity(close: &[Cell], volume: &[Cell], window: usize) -> Vec<Cell> {
    let daily = calculate_returns(close, 1);
    let ratio: Vec<Cell> = (0..close.len())
        .map(|t| {
            let dollar_volume = close[t].zip_with(volume[t], |c, v| Cell::from_f64(c * v));
            daily[t].map(f64::abs).checked_div(dollar_volume)
        })
        .collect();
    rolling_mean(&ratio, window)
}

fn covariance(a: &[f64], b: &[f64], kind: StdKind) -> Result<f64, Missing> {
    let n = a.len();
    if n <= kind.ddof() {
        return Err(Missing::Warmup);
    }
    let (ma, mb) = (mean(a), mean(b));
    let sum: f64 = a.iter().zip(b).map(|(x, y)| (x - ma) * (y - mb)).sum();
    Ok(sum / (n - kind.ddof()) as f64)
}

/// Roll's effective spread relative to close: 2 * sqrt(max(-cov(dp[t], dp[t-1]), 0)) / close.
pub fn roll_spread(close: &[Cell], window: usize, kind: StdKind) -> Vec<Cell> {
    let dp = changes(close);
    let prev_dp = lagged(&dp, 1);
    per_row(close.len(), |t| {
        let current = trailing_window(&dp, t, window)?;
        let previous = trailing_window(&prev_dp, t, window)?;
        let c = close[t].to_result()?;
        if c == 0.0 {
            return Err(Missing::ZeroDivision);
        }
        let cov = covariance(&current, &previous, kind)?;
        Ok(2.0 * (-cov).max(0.0).sqrt() / c)
    })
}

/// Share of the window (today included) at or below today's volume.
pub fn volume_percentile(volume: &[Cell], window: usize) -> Vec<Cell> {
    per_row(volume.len(), |t| {
        let w = trailing_window(volume, t, window)?;
        let today = w[w.len() - 1];
        Ok(w.iter().filter(|&&v| v <= today).count() as f64 / w.len() as f64)
    })
}

/// Volume over its trailing mean; a zero mean is `ZeroDivision`.
pub fn volume_ratio(volume: &[Cell], window: usize) -> Vec<Cell> {
    volume
        .iter()
        .zip(rolling_mean(volume, window))
        .map(|(&v, avg)| v.checked_div(avg))
        .collect()
}
