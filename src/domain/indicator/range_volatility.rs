//! Range-based volatility estimators, annualized as sqrt(252 * mean daily variance).
//!
//! - Parkinson: ln(H/L)^2 / (4 ln 2)
//! - Garman-Klass: 0.5 ln(H/L)^2 - (2 ln 2 - 1) ln(C/O)^2
//! - Rogers-Satchell: ln(H/C) ln(H/O) + ln(L/C) ln(L/O)
//!
//! A non-positive price is `NonPositivePrice`. A negative window mean (Garman-Klass on
//! strongly trending bars) is clamped to zero.

use crate::domain::cell::Cell;
use crate::domain::returns::ln;
use crate::domain::rolling::{TRADING_DAYS_PER_YEAR, rolling_mean};
use std::f64::consts::LN_2;

fn log_ratio(a: Cell, b: Cell) -> Cell {
    ln(a).zip_with(ln(b), |x, y| Cell::from_f64(x - y))
}

fn annualized(daily_variance: &[Cell], window: usize) -> Vec<Cell> {
    rolling_mean(daily_variance, window)
        .into_iter()
        .map(|c| c.map(|v| (TRADING_DAYS_PER_YEAR * v.max(0.0)).sqrt()))
        .collect()
}

pub fn parkinson(high: &[Cell], low: &[Cell], window: usize) -> Vec<Cell> {
    let daily: Vec<Cell> = high
        .iter()
        .zip(low)
        .map(|(&h, &l)| log_ratio(h, l).map(|hl| hl * hl / (4.0 * LN_2)))
        .collect();
    annualized(&daily, window)
}

pub fn garman_klass(open: &[Cell], high: &[Cell], low: &[Cell], close: &[Cell], window: usize) -> Vec<Cell> {
    let daily: Vec<Cell> = (0..close.len())
        .map(|t| {
            log_ratio(high[t], low[t]).zip_with(log_ratio(close[t], open[t]), |hl, co| {
                Cell::from_f64(0.5 * hl * hl - (2.0 * LN_2 - 1.0) * co * co)
            })
        })
        .collect();
    annualized(&daily, window)
}

pub fn rogers_satchell(open: &[Cell], high: &[Cell], low: &[Cell], close: &[Cell], window: usize) -> Vec<Cell> {
    let daily: Vec<Cell> = (0..close.len())
        .map(|t| {
            let up = log_ratio(high[t], close[t]).zip_with(log_ratio(high[t], open[t]), |a, b| Cell::from_f64(a * b));
            let down = log_ratio(low[t], close[t]).zip_with(log_ratio(low[t], open[t]), |a, b| Cell::from_f64(a * b));
            up.zip_with(down, |u, d| Cell::from_f64(u + d))
        })
        .collect();
    annualized(&daily, window)
}
