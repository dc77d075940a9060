//! Bollinger Bands.
//!
//! - Middle = SMA(n)
//! - Upper/Lower = middle ± k * population std over the same window
//! - Width = (upper - lower) / middle
//! - %b = (close - lower) / (upper - lower), `ZeroDivision` on a flat window

use crate::domain::cell::{Cell, Missing};
use crate::domain::rolling::{StdKind, is_flat, mean, per_row, std_dev, trailing_window};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerColumns {
    pub upper: Vec<Cell>,
    pub lower: Vec<Cell>,
    pub width: Vec<Cell>,
    pub percent_b: Vec<Cell>,
}

struct Bands {
    middle: f64,
    upper: f64,
    lower: f64,
    close: f64,
    flat: bool,
}

fn bands_at(close: &[Cell], t: usize, period: usize, multiplier: f64) -> Result<Bands, Missing> {
    let w = trailing_window(close, t, period)?;
    let middle = mean(&w);
    let sd = std_dev(&w, StdKind::Population)?;
    Ok(Bands {
        middle,
        upper: middle + multiplier * sd,
        lower: middle - multiplier * sd,
        close: w[w.len() - 1],
        flat: is_flat(sd, &w),
    })
}

fn column(bands: &[Result<Bands, Missing>], f: impl Fn(&Bands) -> Result<f64, Missing>) -> Vec<Cell> {
    per_row(bands.len(), |t| match &bands[t] {
        Ok(b) => f(b),
        Err(reason) => Err(*reason),
    })
}

pub fn calculate_bollinger(close: &[Cell], period: usize, multiplier: f64) -> BollingerColumns {
    let bands: Vec<Result<Bands, Missing>> = (0..close.len())
        .map(|t| bands_at(close, t, period, multiplier))
        .collect();

    BollingerColumns {
        upper: column(&bands, |b| Ok(b.upper)),
        lower: column(&bands, |b| Ok(b.lower)),
        width: column(&bands, |b| {
            if b.middle == 0.0 {
                Err(Missing::ZeroDivision)
            } else {
                Ok((b.upper - b.lower) / b.middle)
            }
        }),
        percent_b: column(&bands, |b| {
            if b.flat {
                Err(Missing::ZeroDivision)
            } else {
                Ok((b.close - b.lower) / (b.upper - b.lower))
            }
        }),
    }
}
