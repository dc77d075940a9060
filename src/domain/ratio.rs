//! Pointwise cross-series ratios, basket means and spreads on aligned columns.

use crate::domain::cell::Cell;

/// a[t] / b[t]; missing if either side is missing or b[t] is zero.
pub fn ratio(a: &[Cell], b: &[Cell]) -> Vec<Cell> {
    a.iter().zip(b).map(|(&x, &y)| x.checked_div(y)).collect()
}

/// a[t] - b[t]
pub fn spread(a: &[Cell], b: &[Cell]) -> Vec<Cell> {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| x.zip_with(y, |p, q| Cell::from_f64(p - q)))
        .collect()
}

/// Equal-weight mean of the members at each row; any missing member makes the row missing.
pub fn basket_mean(members: &[&[Cell]], len: usize) -> Vec<Cell> {
    (0..len)
        .map(|t| {
            let mut sum = Cell::Value(0.0);
            for member in members {
                sum = sum.zip_with(member[t], |acc, v| Cell::from_f64(acc + v));
            }
            sum.checked_div(Cell::Value(members.len() as f64))
        })
        .collect()
}
