//! MACD (Moving Average Convergence Divergence).
//!
//! - Line = EMA(fast) - EMA(slow)
//! - Signal = EMA(signal) of the line
//! - Histogram = line - signal
//!
//! Warmup: the line is valid from row slow-1, the signal and histogram from slow+signal-2.

use super::ema::calculate_ema;
use crate::domain::cell::Cell;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdColumns {
    pub line: Vec<Cell>,
    pub signal: Vec<Cell>,
    pub histogram: Vec<Cell>,
}

pub fn calculate_macd(close: &[Cell], fast: usize, slow: usize, signal_period: usize) -> MacdColumns {
    let fast_ema = calculate_ema(close, fast);
    let slow_ema = calculate_ema(close, slow);
    let line: Vec<Cell> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(&f, &s)| f.zip_with(s, |f, s| Cell::from_f64(f - s)))
        .collect();
    let signal = calculate_ema(&line, signal_period);
    let histogram = line
        .iter()
        .zip(&signal)
        .map(|(&l, &s)| l.zip_with(s, |l, s| Cell::from_f64(l - s)))
        .collect();
    MacdColumns {
        line,
        signal,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::{Missing, cells_from_values};
    use approx::assert_relative_eq;

    fn rising(n: usize) -> Vec<Cell> {
        cells_from_values(&(0..n).map(|i| 100.0 + i as f64 * (1.0 + (i % 3) as f64)).collect::<Vec<_>>())
    }

    #[test]
    fn macd_warmup() {
        let macd = calculate_macd(&rising(12), 3, 5, 2);
        assert!(macd.line[3].is_missing());
        assert!(!macd.line[4].is_missing());
        assert_eq!(macd.signal[4], Cell::Missing(Missing::Warmup));
        assert!(!macd.signal[5].is_missing());
        assert!(macd.histogram[4].is_missing());
        assert!(!macd.histogram[5].is_missing());
    }

    #[test]
    fn macd_histogram_is_line_minus_signal() {
        let macd = calculate_macd(&rising(20), 3, 5, 2);
        for t in 5..20 {
            let expected = macd.line[t].value().unwrap() - macd.signal[t].value().unwrap();
            assert_relative_eq!(macd.histogram[t].value().unwrap(), expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn macd_rising_prices_have_positive_line() {
        let macd = calculate_macd(&rising(30), 3, 5, 2);
        assert!(macd.line[29].value().unwrap() > 0.0);
    }

    #[test]
    fn macd_constant_prices_are_zero() {
        let macd = calculate_macd(&cells_from_values(&[50.0; 15]), 3, 5, 2);
        assert_relative_eq!(macd.line[14].value().unwrap(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(macd.histogram[14].value().unwrap(), 0.0, epsilon = 1e-9);
    }
}
