//! Rows elapsed since the window's extreme high or low.
//!
//! Ties resolve to the oldest occurrence, so a flat window reads `window - 1`.

use crate::domain::cell::Cell;
use crate::domain::rolling::{per_row, trailing_window};

pub fn days_since_high(high: &[Cell], window: usize) -> Vec<Cell> {
    days_since_extreme(high, window, |candidate, best| candidate > best)
}

pub fn days_since_low(low: &[Cell], window: usize) -> Vec<Cell> {
    days_since_extreme(low, window, |candidate, best| candidate < best)
}

fn days_since_extreme(values: &[Cell], window: usize, beats: impl Fn(f64, f64) -> bool) -> Vec<Cell> {
    per_row(values.len(), |t| {
        let w = trailing_window(values, t, window)?;
        let mut best = 0;
        for (i, &x) in w.iter().enumerate().skip(1) {
            if beats(x, w[best]) {
                best = i;
            }
        }
        Ok((w.len() - 1 - best) as f64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::{Missing, cells_from_values};

    #[test]
    fn days_since_high_known_values() {
        let high = cells_from_values(&[10.0, 15.0, 12.0, 11.0, 16.0]);
        let days = days_since_high(&high, 4);
        assert_eq!(days[2], Cell::Missing(Missing::Warmup));
        assert_eq!(days[3], Cell::Value(2.0));
        assert_eq!(days[4], Cell::Value(0.0));
    }

    #[test]
    fn days_since_low_known_values() {
        let low = cells_from_values(&[10.0, 8.0, 9.0, 9.5]);
        assert_eq!(days_since_low(&low, 3)[3], Cell::Value(2.0));
    }

    #[test]
    fn flat_window_points_at_oldest_row() {
        let flat = cells_from_values(&[5.0; 4]);
        assert_eq!(days_since_high(&flat, 3)[3], Cell::Value(2.0));
        assert_eq!(days_since_low(&flat, 3)[3], Cell::Value(2.0));
    }

    #[test]
    fn gap_in_window_is_missing() {
        let mut high = cells_from_values(&[10.0, 15.0, 12.0, 11.0]);
        high[1] = Cell::Missing(Missing::NoData);
        let days = days_since_high(&high, 3);
        assert_eq!(days[2], Cell::Missing(Missing::NoData));
        assert_eq!(days[3], Cell::Missing(Missing::NoData));
    }
}
