//! Opening gaps and how often they fill the same day.
//!
//! Row t gaps up when open[t] > close[t-1] and fills if low[t] trades back to the previous
//! close; a down gap fills if high[t] does.

use crate::domain::cell::{Cell, Missing};
use crate::domain::rolling::per_row;

#[derive(Debug, Clone, Copy, PartialEq)]
struct GapDay {
    gapped: bool,
    filled: bool,
}

fn gap_day(open: &[Cell], high: &[Cell], low: &[Cell], close: &[Cell], t: usize) -> Result<GapDay, Missing> {
    if t == 0 {
        return Err(Missing::Warmup);
    }
    let prev = close[t - 1].to_result()?;
    let o = open[t].to_result()?;
    let h = high[t].to_result()?;
    let l = low[t].to_result()?;
    let up = o > prev;
    let down = o < prev;
    Ok(GapDay {
        gapped: up || down,
        filled: (up && l <= prev) || (down && h >= prev),
    })
}

/// Filled gaps / gaps over the trailing window; a window without gaps is `ZeroDivision`.
pub fn gap_fill_rate(open: &[Cell], high: &[Cell], low: &[Cell], close: &[Cell], window: usize) -> Vec<Cell> {
    let days: Vec<Result<GapDay, Missing>> = (0..close.len()).map(|t| gap_day(open, high, low, close, t)).collect();
    per_row(close.len(), |t| {
        if window == 0 || t + 1 < window {
            return Err(Missing::Warmup);
        }
        let (mut gaps, mut filled) = (0usize, 0usize);
        for day in &days[t + 1 - window..=t] {
            let day = (*day)?;
            if day.gapped {
                gaps += 1;
            }
            if day.filled {
                filled += 1;
            }
        }
        if gaps == 0 {
            return Err(Missing::ZeroDivision);
        }
        Ok(filled as f64 / gaps as f64)
    })
}
