//! EMA (Exponential Moving Average) and distance from a moving average.
//!
//! k = 2 / (n + 1); seed = SMA of the first n values; EMA = x * k + EMA_prev * (1 - k).
//! Warmup: first n-1 rows.

use super::smoothed;
use crate::domain::cell::Cell;

pub const DEFAULT_EMA_PERIODS: [usize; 3] = [10, 20, 50];

pub fn calculate_ema(values: &[Cell], period: usize) -> Vec<Cell> {
    smoothed(values, period, 2.0 / (period as f64 + 1.0))
}

/// (x - average) / average; a zero average is `ZeroDivision`.
pub fn distance_from_average(values: &[Cell], average: &[Cell]) -> Vec<Cell> {
    values
        .iter()
        .zip(average)
        .map(|(&x, &avg)| x.zip_with(avg, |x, a| Cell::from_f64(x - a)).checked_div(avg))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::{Missing, cells_from_values};
    use crate::domain::rolling::rolling_mean;
    use approx::assert_relative_eq;

    #[test]
    fn ema_warmup() {
        let ema = calculate_ema(&cells_from_values(&[10.0, 20.0, 30.0, 40.0, 50.0]), 3);
        assert_eq!(ema[0], Cell::Missing(Missing::Warmup));
        assert_eq!(ema[1], Cell::Missing(Missing::Warmup));
        assert!(!ema[2].is_missing());
    }

    #[test]
    fn ema_seed_is_sma() {
        let ema = calculate_ema(&cells_from_values(&[10.0, 20.0, 30.0]), 3);
        assert_relative_eq!(ema[2].value().unwrap(), 20.0, epsilon = 1e-12);
    }

    #[test]
    fn ema_recursive_calculation() {
        // k = 0.5 for n = 3
        let ema = calculate_ema(&cells_from_values(&[10.0, 20.0, 30.0, 40.0, 50.0]), 3);
        assert_relative_eq!(ema[3].value().unwrap(), 30.0, epsilon = 1e-12);
        assert_relative_eq!(ema[4].value().unwrap(), 40.0, epsilon = 1e-12);
    }

    #[test]
    fn ema_period_1_tracks_input() {
        let ema = calculate_ema(&cells_from_values(&[3.0, 7.0, 5.0]), 1);
        assert_eq!(ema, cells_from_values(&[3.0, 7.0, 5.0]));
    }

    #[test]
    fn ema_period_0_is_all_warmup() {
        let ema = calculate_ema(&cells_from_values(&[3.0, 7.0]), 0);
        assert!(ema.iter().all(|c| *c == Cell::Missing(Missing::Warmup)));
    }

    #[test]
    fn ema_gap_reseeds() {
        let mut xs = cells_from_values(&[10.0, 20.0, 30.0, 0.0, 40.0, 50.0, 60.0]);
        xs[3] = Cell::Missing(Missing::NoData);
        let ema = calculate_ema(&xs, 2);
        assert_eq!(ema[3], Cell::Missing(Missing::NoData));
        assert_eq!(ema[4], Cell::Missing(Missing::NoData));
        assert_relative_eq!(ema[5].value().unwrap(), 45.0, epsilon = 1e-12);
    }

    #[test]
    fn distance_from_sma_known_values() {
        let close = cells_from_values(&[100.0, 102.0, 101.0, 105.0, 110.0]);
        let dist = distance_from_average(&close, &rolling_mean(&close, 2));
        assert_eq!(dist[0], Cell::Missing(Missing::Warmup));
        assert_relative_eq!(dist[1].value().unwrap(), 1.0 / 101.0, epsilon = 1e-12);
        assert_relative_eq!(dist[4].value().unwrap(), 2.5 / 107.5, epsilon = 1e-12);
    }

    #[test]
    fn distance_from_zero_average_is_zero_division() {
        let close = cells_from_values(&[1.0, -1.0]);
        let dist = distance_from_average(&close, &rolling_mean(&close, 2));
        assert_eq!(dist[1], Cell::Missing(Missing::ZeroDivision));
    }
}
