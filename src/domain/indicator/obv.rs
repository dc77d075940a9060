//! OBV (On-Balance Volume).
//!
//! - First row with a close and a volume: OBV = volume
//! - close > prev_close: OBV += volume
//! - close < prev_close: OBV -= volume
//! - otherwise, or when the previous close is missing: unchanged
//!
//! A row missing its close or volume is missing and leaves the running total alone.

use crate::domain::cell::Cell;

pub fn calculate_obv(close: &[Cell], volume: &[Cell]) -> Vec<Cell> {
    let mut total: Option<f64> = None;
    (0..close.len())
        .map(|t| {
            let (c, v) = match (close[t], volume[t]) {
                (Cell::Value(c), Cell::Value(v)) => (c, v),
                (Cell::Missing(reason), _) | (_, Cell::Missing(reason)) => return Cell::Missing(reason),
            };
            let prev_close = t.checked_sub(1).and_then(|p| close[p].value());
            let next = match (total, prev_close) {
                (None, _) => v,
                (Some(obv), Some(prev)) if c > prev => obv + v,
                (Some(obv), Some(prev)) if c < prev => obv - v,
                (Some(obv), _) => obv,
            };
            total = Some(next);
            Cell::from_f64(next)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::{Missing, cells_from_values};

    #[test]
    fn obv_first_bar_is_volume() {
        let obv = calculate_obv(&cells_from_values(&[100.0]), &cells_from_values(&[1000.0]));
        assert_eq!(obv, vec![Cell::Value(1000.0)]);
    }

    #[test]
    fn obv_adds_volume_on_up_day() {
        let obv = calculate_obv(&cells_from_values(&[100.0, 101.0]), &cells_from_values(&[1000.0, 500.0]));
        assert_eq!(obv[1], Cell::Value(1500.0));
    }

    #[test]
    fn obv_subtracts_volume_on_down_day() {
        let obv = calculate_obv(&cells_from_values(&[100.0, 99.0]), &cells_from_values(&[1000.0, 400.0]));
        assert_eq!(obv[1], Cell::Value(600.0));
    }

    #[test]
    fn obv_unchanged_on_flat_day() {
        let obv = calculate_obv(&cells_from_values(&[100.0, 100.0]), &cells_from_values(&[1000.0, 400.0]));
        assert_eq!(obv[1], Cell::Value(1000.0));
    }

    #[test]
    fn obv_gap_holds_the_total() {
        let mut close = cells_from_values(&[100.0, 101.0, 0.0, 103.0, 102.0]);
        close[2] = Cell::Missing(Missing::NoData);
        let volume = cells_from_values(&[1000.0, 100.0, 100.0, 100.0, 50.0]);
        let obv = calculate_obv(&close, &volume);

        assert_eq!(obv[1], Cell::Value(1100.0));
        assert_eq!(obv[2], Cell::Missing(Missing::NoData));
        // no previous close to compare against
        assert_eq!(obv[3], Cell::Value(1100.0));
        assert_eq!(obv[4], Cell::Value(1050.0));
    }

    #[test]
    fn obv_seeds_at_first_complete_row() {
        let close = cells_from_values(&[100.0, 101.0, 102.0]);
        let mut volume = cells_from_values(&[0.0, 700.0, 300.0]);
        volume[0] = Cell::Missing(Missing::NoData);
        let obv = calculate_obv(&close, &volume);
        assert_eq!(obv, vec![Cell::Missing(Missing::NoData), Cell::Value(700.0), Cell::Value(1000.0)]);
    }
}
