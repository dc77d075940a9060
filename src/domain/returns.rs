//! Return engine: simple, N-day, log and overnight/intraday returns.
//!
//! RET(n)[t] = P[t] / P[t-n] - 1
//! LOGRET[t] = ln(P[t]) - ln(P[t-1])
//! Warmup: first n rows are missing. Every return uses data at or before t only.

use crate::domain::cell::{Cell, Missing};

/// N-day simple return. `n = 1` is the daily return.
pub fn calculate_returns(prices: &[Cell], n: usize) -> Vec<Cell> {
    (0..prices.len())
        .map(|t| {
            if n == 0 || t < n {
                return Cell::Missing(Missing::Warmup);
            }
            prices[t]
                .checked_div(prices[t - n])
                .zip_with(Cell::Value(1.0), |ratio, one| Cell::from_f64(ratio - one))
        })
        .collect()
}

/// Natural log of a price; non-positive prices are `NonPositivePrice`.
pub(crate) fn ln(cell: Cell) -> Cell {
    match cell {
        Cell::Value(p) if p > 0.0 => Cell::from_f64(p.ln()),
        Cell::Value(_) => Cell::Missing(Missing::NonPositivePrice),
        missing => missing,
    }
}

/// Daily log return; a non-positive price on either side is `NonPositivePrice`.
pub fn calculate_log_returns(prices: &[Cell]) -> Vec<Cell> {
    let logs: Vec<Cell> = prices.iter().map(|&p| ln(p)).collect();
    (0..logs.len())
        .map(|t| {
            if t == 0 {
                return Cell::Missing(Missing::Warmup);
            }
            logs[t].zip_with(logs[t - 1], |a, b| Cell::from_f64(a - b))
        })
        .collect()
}

/// open[t] / close[t-1] - 1
pub fn calculate_overnight_returns(open: &[Cell], close: &[Cell]) -> Vec<Cell> {
    (0..open.len())
        .map(|t| {
            if t == 0 {
                return Cell::Missing(Missing::Warmup);
            }
            open[t]
                .checked_div(close[t - 1])
                .zip_with(Cell::Value(1.0), |ratio, one| Cell::from_f64(ratio - one))
        })
        .collect()
}

/// close[t] / open[t] - 1
pub fn calculate_intraday_returns(open: &[Cell], close: &[Cell]) -> Vec<Cell> {
    close
        .iter()
        .zip(open)
        .map(|(&c, &o)| {
            c.checked_div(o)
                .zip_with(Cell::Value(1.0), |ratio, one| Cell::from_f64(ratio - one))
        })
        .collect()
}

/// close[t+1] / close[t] - 1. This is a training label and looks forward by construction.
pub fn calculate_next_day_returns(prices: &[Cell]) -> Vec<Cell> {
    (0..prices.len())
        .map(|t| {
            if t + 1 >= prices.len() {
                return Cell::Missing(Missing::NoData);
            }
            prices[t + 1]
                .checked_div(prices[t])
                .zip_with(Cell::Value(1.0), |ratio, one| Cell::from_f64(ratio - one))
        })
        .collect()
}

/// Rebuilds prices as `anchor * exp(cumsum(log_returns))`, anchored at row 0.
///
/// A missing log return breaks the chain; later rows stay missing.
pub fn reconstruct_prices(anchor: f64, log_returns: &[Cell]) -> Vec<Cell> {
    let mut level = Cell::from_f64(anchor.ln());
    log_returns
        .iter()
        .enumerate()
        .map(|(t, &r)| {
            if t > 0 {
                level = level.zip_with(r, |acc, step| Cell::from_f64(acc + step));
            }
            match level {
                Cell::Value(l) => Cell::from_f64(l.exp()),
                missing => missing,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::cells_from_values;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn daily_returns_known_values() {
        let prices = cells_from_values(&[100.0, 102.0, 101.0, 105.0, 110.0]);
        let r = calculate_returns(&prices, 1);

        assert_eq!(r[0], Cell::Missing(Missing::Warmup));
        assert_relative_eq!(r[1].value().unwrap(), 0.02, epsilon = 1e-12);
        assert_relative_eq!(r[2].value().unwrap(), -0.0098, epsilon = 1e-4);
        assert_relative_eq!(r[3].value().unwrap(), 0.0396, epsilon = 1e-4);
        assert_relative_eq!(r[4].value().unwrap(), 0.0476, epsilon = 1e-4);
    }

    #[test]
    fn n_day_return_warmup_and_value() {
        let prices = cells_from_values(&[100.0, 102.0, 101.0, 105.0, 110.0]);
        let r = calculate_returns(&prices, 3);
        assert!(r[..3].iter().all(|c| *c == Cell::Missing(Missing::Warmup)));
        assert_relative_eq!(r[3].value().unwrap(), 0.05, epsilon = 1e-12);
        assert_relative_eq!(r[4].value().unwrap(), 110.0 / 102.0 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn return_missing_when_previous_missing() {
        let prices = vec![Cell::Value(100.0), Cell::Missing(Missing::NoData), Cell::Value(101.0)];
        let r = calculate_returns(&prices, 1);
        assert_eq!(r[1], Cell::Missing(Missing::NoData));
        assert_eq!(r[2], Cell::Missing(Missing::NoData));
    }

    #[test]
    fn return_zero_base_is_zero_division() {
        let prices = cells_from_values(&[0.0, 5.0]);
        let r = calculate_returns(&prices, 1);
        assert_eq!(r[1], Cell::Missing(Missing::ZeroDivision));
    }

    #[test]
    fn log_return_non_positive_price() {
        let prices = cells_from_values(&[100.0, -1.0, 100.0, 0.0]);
        let r = calculate_log_returns(&prices);
        assert_eq!(r[1], Cell::Missing(Missing::NonPositivePrice));
        assert_eq!(r[2], Cell::Missing(Missing::NonPositivePrice));
        assert_eq!(r[3], Cell::Missing(Missing::NonPositivePrice));
    }

    #[test]
    fn log_return_value() {
        let prices = cells_from_values(&[100.0, 110.0]);
        let r = calculate_log_returns(&prices);
        assert_relative_eq!(r[1].value().unwrap(), (1.1f64).ln(), epsilon = 1e-12);
    }

    #[test]
    fn overnight_and_intraday_decompose_daily() {
        let open = cells_from_values(&[100.0, 103.0]);
        let close = cells_from_values(&[101.0, 104.0]);
        let on = calculate_overnight_returns(&open, &close);
        let id = calculate_intraday_returns(&open, &close);
        let daily = calculate_returns(&close, 1);

        assert!(on[0].is_missing());
        let combined = (1.0 + on[1].value().unwrap()) * (1.0 + id[1].value().unwrap()) - 1.0;
        assert_relative_eq!(combined, daily[1].value().unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn next_day_return_last_row_missing() {
        let prices = cells_from_values(&[100.0, 110.0]);
        let r = calculate_next_day_returns(&prices);
        assert_relative_eq!(r[0].value().unwrap(), 0.1, epsilon = 1e-12);
        assert!(r[1].is_missing());
    }

    #[test]
    fn reconstruct_stops_at_gap() {
        let log_returns = vec![
            Cell::Missing(Missing::Warmup),
            Cell::Value(0.0),
            Cell::Missing(Missing::NoData),
            Cell::Value(0.1),
        ];
        let prices = reconstruct_prices(50.0, &log_returns);
        assert_relative_eq!(prices[0].value().unwrap(), 50.0, epsilon = 1e-9);
        assert_relative_eq!(prices[1].value().unwrap(), 50.0, epsilon = 1e-9);
        assert!(prices[2].is_missing());
        assert!(prices[3].is_missing());
    }

    proptest! {
        #[test]
        fn log_returns_round_trip(prices in prop::collection::vec(0.01f64..10_000.0, 1..200)) {
            let cells = cells_from_values(&prices);
            let rebuilt = reconstruct_prices(prices[0], &calculate_log_returns(&cells));
            for (orig, back) in prices.iter().zip(rebuilt) {
                let back = back.value().unwrap();
                prop_assert!((orig - back).abs() <= 1e-9 * orig.max(1.0));
            }
        }
    }
}
