//! Feature cells: a value or an explicit, reasoned gap.
//!
//! Zero is a value. Missing is never zero.

use std::fmt;

/// Why a cell has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Missing {
    /// The input series had no observation for this date.
    NoData,
    /// Not enough history yet for the window or lag.
    Warmup,
    /// Denominator (ratio, return base, z-score std) was zero.
    ZeroDivision,
    /// Logarithm of a non-positive price.
    NonPositivePrice,
    /// The external sentiment scorer failed for every article of the day.
    ScorerFailure,
}

impl Missing {
    pub const ALL: [Missing; 5] = [
        Missing::NoData,
        Missing::Warmup,
        Missing::ZeroDivision,
        Missing::NonPositivePrice,
        Missing::ScorerFailure,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Missing::NoData => "no_data",
            Missing::Warmup => "warmup",
            Missing::ZeroDivision => "zero_division",
            Missing::NonPositivePrice => "non_positive_price",
            Missing::ScorerFailure => "scorer_failure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Value(f64),
    Missing(Missing),
}

impl Cell {
    /// Wraps a finite number; NaN and infinities become `NoData` so they never leak into output.
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Cell::Value(value)
        } else {
            Cell::Missing(Missing::NoData)
        }
    }

    pub fn from_option(value: Option<f64>) -> Self {
        match value {
            Some(v) => Cell::from_f64(v),
            None => Cell::Missing(Missing::NoData),
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Cell::Value(v) => Some(*v),
            Cell::Missing(_) => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing(_))
    }

    pub fn missing_reason(&self) -> Option<Missing> {
        match self {
            Cell::Value(_) => None,
            Cell::Missing(reason) => Some(*reason),
        }
    }

    pub fn to_result(self) -> Result<f64, Missing> {
        match self {
            Cell::Value(v) => Ok(v),
            Cell::Missing(reason) => Err(reason),
        }
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Cell {
        match self {
            Cell::Value(v) => Cell::from_f64(f(v)),
            missing => missing,
        }
    }

    /// Applies `f` to two present values; otherwise propagates the first gap.
    pub fn zip_with(self, other: Cell, f: impl FnOnce(f64, f64) -> Cell) -> Cell {
        match (self, other) {
            (Cell::Value(a), Cell::Value(b)) => f(a, b),
            (Cell::Missing(reason), _) | (_, Cell::Missing(reason)) => Cell::Missing(reason),
        }
    }

    /// `a / b`, missing on a zero denominator.
    pub fn checked_div(self, other: Cell) -> Cell {
        self.zip_with(other, |a, b| {
            if b == 0.0 {
                Cell::Missing(Missing::ZeroDivision)
            } else {
                Cell::from_f64(a / b)
            }
        })
    }

    /// Numerical equality used by the causality audit: same gap-ness, values within `rel_tol`.
    pub fn matches(&self, other: &Cell, rel_tol: f64) -> bool {
        match (self, other) {
            (Cell::Value(a), Cell::Value(b)) => {
                let scale = a.abs().max(b.abs()).max(1.0);
                (a - b).abs() <= rel_tol * scale
            }
            (Cell::Missing(_), Cell::Missing(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Value(v) => write!(f, "{}", v),
            Cell::Missing(_) => Ok(()),
        }
    }
}

pub fn cells_from_values(values: &[f64]) -> Vec<Cell> {
    values.iter().map(|&v| Cell::from_f64(v)).collect()
}
