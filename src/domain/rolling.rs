//! Trailing-window statistics: mean, std, z-score, correlation, realized vol,
//! skew and kurtosis, breadth.
//!
//! Every window ends at t and spans the W most recent rows (never centered).
//! A window is usable only when all W cells are present; otherwise the output is
//! missing with `Warmup` for t < W-1, or the reason of the first gap inside it.

use crate::domain::cell::{Cell, Missing};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Windows whose spread is below this fraction of their magnitude are treated as flat.
const FLAT_WINDOW_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StdKind {
    /// Divide by W.
    #[default]
    Population,
    /// Divide by W - 1.
    Sample,
}

impl StdKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "population" | "pop" => Some(StdKind::Population),
            "sample" => Some(StdKind::Sample),
            _ => None,
        }
    }

    pub(crate) fn ddof(&self) -> usize {
        match self {
            StdKind::Population => 0,
            StdKind::Sample => 1,
        }
    }
}

/// The `window` values ending at row `t`, or why they are not all available.
pub(crate) fn trailing_window(values: &[Cell], t: usize, window: usize) -> Result<Vec<f64>, Missing> {
    if window == 0 || t + 1 < window {
        return Err(Missing::Warmup);
    }
    values[t + 1 - window..=t]
        .iter()
        .map(|c| match c {
            Cell::Value(v) => Ok(*v),
            Cell::Missing(reason) => Err(*reason),
        })
        .collect()
}

pub(crate) fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

pub(crate) fn std_dev(xs: &[f64], kind: StdKind) -> Result<f64, Missing> {
    let n = xs.len();
    if n <= kind.ddof() {
        return Err(Missing::Warmup);
    }
    let m = mean(xs);
    let ss: f64 = xs.iter().map(|x| (x - m) * (x - m)).sum();
    Ok((ss / (n - kind.ddof()) as f64).sqrt())
}

pub(crate) fn is_flat(std: f64, xs: &[f64]) -> bool {
    let scale = xs.iter().fold(1.0_f64, |acc, x| acc.max(x.abs()));
    std <= FLAT_WINDOW_TOLERANCE * scale
}

pub(crate) fn per_row(len: usize, f: impl Fn(usize) -> Result<f64, Missing>) -> Vec<Cell> {
    (0..len)
        .map(|t| match f(t) {
            Ok(v) => Cell::from_f64(v),
            Err(reason) => Cell::Missing(reason),
        })
        .collect()
}

pub fn rolling_mean(values: &[Cell], window: usize) -> Vec<Cell> {
    per_row(values.len(), |t| trailing_window(values, t, window).map(|w| mean(&w)))
}

pub fn rolling_std(values: &[Cell], window: usize, kind: StdKind) -> Vec<Cell> {
    per_row(values.len(), |t| {
        let w = trailing_window(values, t, window)?;
        std_dev(&w, kind)
    })
}

/// (x[t] - mean) / std over the trailing window; a flat window is `ZeroDivision`.
pub fn rolling_zscore(values: &[Cell], window: usize, kind: StdKind) -> Vec<Cell> {
    per_row(values.len(), |t| {
        let w = trailing_window(values, t, window)?;
        let sd = std_dev(&w, kind)?;
        if is_flat(sd, &w) {
            return Err(Missing::ZeroDivision);
        }
        Ok((w[w.len() - 1] - mean(&w)) / sd)
    })
}

/// Pearson correlation of `a` and `b` over the trailing window.
pub fn rolling_correlation(a: &[Cell], b: &[Cell], window: usize) -> Vec<Cell> {
    per_row(a.len().min(b.len()), |t| {
        let wa = trailing_window(a, t, window)?;
        let wb = trailing_window(b, t, window)?;
        let (ma, mb) = (mean(&wa), mean(&wb));
        let mut cov = 0.0;
        let mut va = 0.0;
        let mut vb = 0.0;
        for (x, y) in wa.iter().zip(&wb) {
            cov += (x - ma) * (y - mb);
            va += (x - ma) * (x - ma);
            vb += (y - mb) * (y - mb);
        }
        let (sa, sb) = (va.sqrt(), vb.sqrt());
        if is_flat(sa, &wa) || is_flat(sb, &wb) {
            return Err(Missing::ZeroDivision);
        }
        Ok(cov / (sa * sb))
    })
}

/// sqrt(252) * std(log returns) over the trailing window.
pub fn realized_volatility(log_returns: &[Cell], window: usize, kind: StdKind) -> Vec<Cell> {
    rolling_std(log_returns, window, kind)
        .into_iter()
        .map(|c| match c {
            Cell::Value(sd) => Cell::from_f64(TRADING_DAYS_PER_YEAR.sqrt() * sd),
            missing => missing,
        })
        .collect()
}

/// Population central moments (m2, m3, m4) of a window; a flat window is `ZeroDivision`.
fn central_moments(xs: &[f64]) -> Result<(f64, f64, f64), Missing> {
    let n = xs.len() as f64;
    let m = mean(xs);
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for x in xs {
        let d = x - m;
        m2 += d * d;
        m3 += d * d * d;
        m4 += d * d * d * d;
    }
    let (m2, m3, m4) = (m2 / n, m3 / n, m4 / n);
    if is_flat(m2.sqrt(), xs) {
        return Err(Missing::ZeroDivision);
    }
    Ok((m2, m3, m4))
}

/// Skewness m3 / m2^1.5 over the trailing window.
pub fn rolling_skew(values: &[Cell], window: usize) -> Vec<Cell> {
    per_row(values.len(), |t| {
        let (m2, m3, _) = central_moments(&trailing_window(values, t, window)?)?;
        Ok(m3 / m2.powf(1.5))
    })
}

/// Excess kurtosis m4 / m2^2 - 3 over the trailing window (normal = 0).
pub fn rolling_kurtosis(values: &[Cell], window: usize) -> Vec<Cell> {
    per_row(values.len(), |t| {
        let (m2, _, m4) = central_moments(&trailing_window(values, t, window)?)?;
        Ok(m4 / (m2 * m2) - 3.0)
    })
}

/// values[t - lag]; the first `lag` rows are `Warmup`.
pub fn lagged(values: &[Cell], lag: usize) -> Vec<Cell> {
    (0..values.len())
        .map(|t| if t < lag { Cell::Missing(Missing::Warmup) } else { values[t - lag] })
        .collect()
}

/// Correlation of a series with itself `lag` rows earlier, over the trailing window.
pub fn rolling_autocorrelation(values: &[Cell], window: usize, lag: usize) -> Vec<Cell> {
    rolling_correlation(values, &lagged(values, lag), window)
}

/// Count of peers whose trailing return strictly exceeds the benchmark's at each date.
///
/// Inputs are already trailing-K-day returns. Ties do not count. Peers missing at t
/// are skipped; if the benchmark or every peer is missing the count is missing.
pub fn breadth_count(benchmark: &[Cell], peers: &[&[Cell]]) -> Vec<Cell> {
    (0..benchmark.len())
        .map(|t| {
            let bench = match benchmark[t] {
                Cell::Value(v) => v,
                missing => return missing,
            };
            let mut valid = 0usize;
            let mut outperforming = 0usize;
            for peer in peers {
                if let Some(r) = peer.get(t).and_then(|c| c.value()) {
                    valid += 1;
                    if r > bench {
                        outperforming += 1;
                    }
                }
            }
            if valid == 0 {
                Cell::Missing(Missing::NoData)
            } else {
                Cell::Value(outperforming as f64)
            }
        })
        .collect()
}
