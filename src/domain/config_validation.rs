//! Configuration validation.
//!
//! Validates every config key before any data is read. The `parse_*` helpers are
//! shared with [`crate::domain::plan`] so both agree on formats and defaults.

use crate::domain::calendar::parse_utc_offset;
use crate::domain::error::SignalframeError;
use crate::domain::indicator::IndicatorSpec;
use crate::domain::resample::Frequency;
use crate::domain::rolling::StdKind;
use crate::ports::config_port::ConfigPort;
use chrono::{FixedOffset, NaiveDate};
use std::collections::HashSet;

pub const DEFAULT_RETURN_WINDOWS: [usize; 3] = [5, 10, 20];
pub const DEFAULT_ROLLING_WINDOWS: [usize; 3] = [5, 20, 60];
pub const DEFAULT_ZSCORE_WINDOW: usize = 252;
pub const DEFAULT_CORRELATION_WINDOW: usize = 60;
pub const DEFAULT_BREADTH_WINDOW: usize = 20;
pub const DEFAULT_CAUSALITY_SAMPLES: usize = 5;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), SignalframeError> {
    validate_data(config)?;
    validate_universe(config)?;
    validate_macro(config)?;
    validate_windows(config)?;
    parse_indicators(config)?;
    validate_sentiment(config)?;
    validate_output(config)?;
    Ok(())
}

fn validate_data(config: &dyn ConfigPort) -> Result<(), SignalframeError> {
    required(config, "data", "dir")?;
    let start = parse_date(config, "data", "start_date")?;
    let end = parse_date(config, "data", "end_date")?;
    if start >= end {
        return Err(SignalframeError::config_invalid(
            "data",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    parse_offset(config)?;
    Ok(())
}

fn validate_universe(config: &dyn ConfigPort) -> Result<(), SignalframeError> {
    let benchmark = required(config, "universe", "benchmark")?;
    let peers = config.get_list("universe", "peers");

    let mut universe = HashSet::new();
    universe.insert(benchmark.clone());
    for peer in &peers {
        if !universe.insert(peer.clone()) {
            return Err(SignalframeError::config_invalid(
                "universe",
                "peers",
                format!("{} listed twice (the benchmark may not be a peer)", peer),
            ));
        }
    }

    let growth = config.get_list("universe", "growth");
    let defensive = config.get_list("universe", "defensive");
    match (growth.is_empty(), defensive.is_empty()) {
        (true, false) => return Err(SignalframeError::config_missing("universe", "growth")),
        (false, true) => return Err(SignalframeError::config_missing("universe", "defensive")),
        _ => {}
    }
    for (key, basket) in [("growth", &growth), ("defensive", &defensive)] {
        if let Some(s) = basket.iter().find(|s| !universe.contains(*s)) {
            return Err(SignalframeError::config_invalid(
                "universe",
                key,
                format!("{} is neither the benchmark nor a peer", s),
            ));
        }
    }

    for (a, b) in parse_pairs(config, "universe", "ratios", '/')? {
        if let Some(s) = [&a, &b].into_iter().find(|s| !universe.contains(*s)) {
            return Err(SignalframeError::config_invalid(
                "universe",
                "ratios",
                format!("{} is neither the benchmark nor a peer", s),
            ));
        }
    }
    Ok(())
}

fn validate_macro(config: &dyn ConfigPort) -> Result<(), SignalframeError> {
    let names = config.get_list("macro", "series");
    let mut known = HashSet::new();
    for name in &names {
        if !known.insert(name.as_str()) {
            return Err(SignalframeError::config_invalid(
                "macro",
                "series",
                format!("{} listed twice", name),
            ));
        }
    }

    let global_lag = parse_lag(config, "macro", "lag_days")?;
    if global_lag == 0 {
        return Err(SignalframeError::config_invalid(
            "macro",
            "lag_days",
            "lag_days must be at least 1; use a per-series override for same-day attribution",
        ));
    }
    for name in &names {
        series_lag(config, name, global_lag)?;
        series_frequency(config, name)?;
    }

    for (a, b) in parse_pairs(config, "macro", "spreads", '-')? {
        if let Some(s) = [&a, &b].into_iter().find(|s| !known.contains(s.as_str())) {
            return Err(SignalframeError::config_invalid(
                "macro",
                "spreads",
                format!("{} is not in macro series", s),
            ));
        }
    }
    Ok(())
}

fn validate_windows(config: &dyn ConfigPort) -> Result<(), SignalframeError> {
    parse_window_list(config, "windows", "returns", &DEFAULT_RETURN_WINDOWS, 1)?;
    parse_window_list(config, "windows", "rolling", &DEFAULT_ROLLING_WINDOWS, 2)?;
    parse_window(config, "windows", "zscore", DEFAULT_ZSCORE_WINDOW, 2)?;
    parse_window(config, "windows", "correlation", DEFAULT_CORRELATION_WINDOW, 2)?;
    parse_window(config, "windows", "breadth", DEFAULT_BREADTH_WINDOW, 1)?;
    parse_std_kind(config)?;
    Ok(())
}

fn validate_sentiment(config: &dyn ConfigPort) -> Result<(), SignalframeError> {
    if config.get_string("sentiment", "articles").is_none() {
        return Ok(());
    }
    required(config, "sentiment", "scores")?;
    if parse_usize(config, "sentiment", "max_per_day", crate::domain::sentiment::DEFAULT_MAX_PER_DAY)? == 0 {
        return Err(SignalframeError::config_invalid(
            "sentiment",
            "max_per_day",
            "max_per_day must be at least 1",
        ));
    }
    parse_lag(config, "sentiment", "lag_days")?;
    Ok(())
}

fn validate_output(config: &dyn ConfigPort) -> Result<(), SignalframeError> {
    parse_usize(config, "output", "causality_samples", DEFAULT_CAUSALITY_SAMPLES)?;
    parse_bool(config, "output", "target", false)?;
    for key in ["path", "report"] {
        if let Some(v) = config.get_string("output", key) {
            if v.trim().is_empty() {
                return Err(SignalframeError::config_invalid("output", key, "path must not be empty"));
            }
        }
    }
    Ok(())
}

pub(crate) fn required(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, SignalframeError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(SignalframeError::config_missing(section, key)),
    }
}

pub(crate) fn parse_date(config: &dyn ConfigPort, section: &str, key: &str) -> Result<NaiveDate, SignalframeError> {
    let raw = required(config, section, key)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
        SignalframeError::config_invalid(section, key, format!("invalid {} format, expected YYYY-MM-DD", key))
    })
}

pub(crate) fn parse_offset(config: &dyn ConfigPort) -> Result<FixedOffset, SignalframeError> {
    let raw = config
        .get_string("data", "utc_offset")
        .unwrap_or_else(|| "+00:00".to_string());
    parse_utc_offset(&raw).ok_or_else(|| {
        SignalframeError::config_invalid("data", "utc_offset", format!("invalid offset '{}', expected +HH:MM", raw))
    })
}

pub(crate) fn parse_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, SignalframeError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
            SignalframeError::config_invalid(section, key, format!("'{}' is not a non-negative integer", raw))
        }),
    }
}

pub(crate) fn parse_lag(config: &dyn ConfigPort, section: &str, key: &str) -> Result<u32, SignalframeError> {
    match config.get_string(section, key) {
        None => Ok(crate::domain::resample::DEFAULT_LAG_DAYS),
        Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
            SignalframeError::config_invalid(section, key, format!("'{}' is not a whole number of days", raw))
        }),
    }
}

pub(crate) fn parse_bool(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, SignalframeError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            _ => Err(SignalframeError::config_invalid(
                section,
                key,
                format!("'{}' is not a boolean", raw),
            )),
        },
    }
}

/// Per-series lag override `<name>_lag`, falling back to `global`.
///
/// Zero is accepted only here; the plan flags such series as same-day.
pub(crate) fn series_lag(config: &dyn ConfigPort, name: &str, global: u32) -> Result<u32, SignalframeError> {
    let key = format!("{}_lag", name.to_lowercase());
    match config.get_string("macro", &key) {
        None => Ok(global),
        Some(_) => parse_lag(config, "macro", &key),
    }
}

pub(crate) fn series_frequency(config: &dyn ConfigPort, name: &str) -> Result<Frequency, SignalframeError> {
    let key = format!("{}_frequency", name.to_lowercase());
    match config.get_string("macro", &key) {
        None => Ok(Frequency::Monthly),
        Some(raw) => Frequency::parse(&raw).ok_or_else(|| {
            SignalframeError::config_invalid(
                "macro",
                &key,
                format!("'{}' is not one of daily, weekly, monthly, quarterly", raw),
            )
        }),
    }
}

pub(crate) fn parse_window(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
    min: usize,
) -> Result<usize, SignalframeError> {
    let w = parse_usize(config, section, key, default)?;
    if w < min {
        return Err(SignalframeError::config_invalid(
            section,
            key,
            format!("window must be at least {}", min),
        ));
    }
    Ok(w)
}

pub(crate) fn parse_window_list(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: &[usize],
    min: usize,
) -> Result<Vec<usize>, SignalframeError> {
    let items = config.get_list(section, key);
    if items.is_empty() {
        return Ok(default.to_vec());
    }
    let mut windows = Vec::with_capacity(items.len());
    for item in items {
        let w: usize = item.parse().map_err(|_| {
            SignalframeError::config_invalid(section, key, format!("'{}' is not a window length", item))
        })?;
        if w < min {
            return Err(SignalframeError::config_invalid(
                section,
                key,
                format!("window must be at least {}", min),
            ));
        }
        if windows.contains(&w) {
            return Err(SignalframeError::config_invalid(
                section,
                key,
                format!("window {} listed twice", w),
            ));
        }
        windows.push(w);
    }
    Ok(windows)
}

pub(crate) fn parse_std_kind(config: &dyn ConfigPort) -> Result<StdKind, SignalframeError> {
    match config.get_string("windows", "std") {
        None => Ok(StdKind::default()),
        Some(raw) => StdKind::parse(&raw).ok_or_else(|| {
            SignalframeError::config_invalid("windows", "std", format!("'{}' is not population or sample", raw))
        }),
    }
}

/// The `[indicators]` section; `None` when `enabled = false`.
pub(crate) fn parse_indicators(config: &dyn ConfigPort) -> Result<Option<IndicatorSpec>, SignalframeError> {
    const SECTION: &str = "indicators";
    if !parse_bool(config, SECTION, "enabled", true)? {
        return Ok(None);
    }
    let defaults = IndicatorSpec::default();
    let spec = IndicatorSpec {
        ema: parse_window_list(config, SECTION, "ema", &defaults.ema, 1)?,
        macd_fast: parse_window(config, SECTION, "macd_fast", defaults.macd_fast, 1)?,
        macd_slow: parse_window(config, SECTION, "macd_slow", defaults.macd_slow, 2)?,
        macd_signal: parse_window(config, SECTION, "macd_signal", defaults.macd_signal, 1)?,
        rsi: parse_window(config, SECTION, "rsi", defaults.rsi, 1)?,
        stochastic_k: parse_window(config, SECTION, "stochastic_k", defaults.stochastic_k, 1)?,
        stochastic_d: parse_window(config, SECTION, "stochastic_d", defaults.stochastic_d, 1)?,
        bollinger: parse_window(config, SECTION, "bollinger", defaults.bollinger, 2)?,
        bollinger_std: parse_positive_f64(config, SECTION, "bollinger_std", defaults.bollinger_std)?,
        atr: parse_window(config, SECTION, "atr", defaults.atr, 1)?,
    };
    if spec.macd_fast >= spec.macd_slow {
        return Err(SignalframeError::config_invalid(
            SECTION,
            "macd_slow",
            format!("macd_slow ({}) must exceed macd_fast ({})", spec.macd_slow, spec.macd_fast),
        ));
    }
    Ok(Some(spec))
}

pub(crate) fn parse_positive_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, SignalframeError> {
    let raw = match config.get_string(section, key) {
        None => return Ok(default),
        Some(raw) => raw,
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(SignalframeError::config_invalid(
            section,
            key,
            format!("'{}' is not a positive number", raw),
        )),
    }
}

/// `A<sep>B` items of a comma list, e.g. `XLK/XLU` or `DGS10-DGS2`.
pub(crate) fn parse_pairs(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    sep: char,
) -> Result<Vec<(String, String)>, SignalframeError> {
    let mut pairs = Vec::new();
    for item in config.get_list(section, key) {
        let (a, b) = item.split_once(sep).ok_or_else(|| {
            SignalframeError::config_invalid(section, key, format!("'{}' is not of the form A{}B", item, sep))
        })?;
        let (a, b) = (a.trim().to_string(), b.trim().to_string());
        if a.is_empty() || b.is_empty() || a == b {
            return Err(SignalframeError::config_invalid(
                section,
                key,
                format!("'{}' needs two distinct names", item),
            ));
        }
        let pair = (a, b);
        if pairs.contains(&pair) {
            return Err(SignalframeError::config_invalid(
                section,
                key,
                format!("'{}' listed twice", item),
            ));
        }
        pairs.push(pair);
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const BASE: &str = "[data]\ndir = data\nstart_date = 2020-01-01\nend_date = 2024-12-31\n[universe]\nbenchmark = SPY\npeers = XLK, XLU, GLD\n";

    fn make_config(extra: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(&format!("{}{}", BASE, extra)).unwrap()
    }

    #[test]
    fn minimal_config_passes() {
        assert!(validate_config(&make_config("")).is_ok());
    }

    #[test]
    fn full_config_passes() {
        let config = make_config(
            "growth = XLK\ndefensive = XLU\nratios = XLK/XLU, GLD/SPY\n\
             [macro]\nseries = CPI, DGS10, DGS2\nlag_days = 1\ncpi_lag = 14\ndgs10_frequency = daily\ndgs2_frequency = daily\ndgs10_lag = 0\nspreads = DGS10-DGS2\n\
             [windows]\nreturns = 1, 5\nrolling = 5, 20\nzscore = 252\nstd = sample\n\
             [sentiment]\narticles = news.csv\nscores = scores.csv\nmax_per_day = 10\n\
             [output]\npath = out.csv\ncausality_samples = 3\ntarget = true\n",
        );
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn missing_dir_fails() {
        let config = FileConfigAdapter::from_string(
            "[data]\nstart_date = 2020-01-01\nend_date = 2024-12-31\n[universe]\nbenchmark = SPY\n",
        )
        .unwrap();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, SignalframeError::ConfigMissing { key, .. } if key == "dir"));
    }

    #[test]
    fn start_after_end_fails() {
        let config = FileConfigAdapter::from_string(
            "[data]\ndir = d\nstart_date = 2024-12-31\nend_date = 2020-01-01\n[universe]\nbenchmark = SPY\n",
        )
        .unwrap();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, SignalframeError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn bad_date_format_fails() {
        let config = FileConfigAdapter::from_string(
            "[data]\ndir = d\nstart_date = 2020/01/01\nend_date = 2024-12-31\n[universe]\nbenchmark = SPY\n",
        )
        .unwrap();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, SignalframeError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn bad_offset_fails() {
        let config = FileConfigAdapter::from_string(
            "[data]\ndir = d\nstart_date = 2020-01-01\nend_date = 2024-12-31\nutc_offset = EST\n[universe]\nbenchmark = SPY\n",
        )
        .unwrap();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, SignalframeError::ConfigInvalid { key, .. } if key == "utc_offset"));
    }

    #[test]
    fn benchmark_as_peer_fails() {
        let config = FileConfigAdapter::from_string(&BASE.replace("XLK, XLU, GLD", "XLK, SPY")).unwrap();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, SignalframeError::ConfigInvalid { key, .. } if key == "peers"));
    }

    #[test]
    fn one_sided_basket_fails() {
        let err = validate_config(&make_config("growth = XLK\n")).unwrap_err();
        assert!(matches!(err, SignalframeError::ConfigMissing { key, .. } if key == "defensive"));
    }

    #[test]
    fn ratio_outside_universe_fails() {
        let err = validate_config(&make_config("ratios = XLK/QQQ\n")).unwrap_err();
        assert!(matches!(err, SignalframeError::ConfigInvalid { key, reason, .. } if key == "ratios" && reason.contains("QQQ")));
    }

    #[test]
    fn malformed_ratio_fails() {
        let err = validate_config(&make_config("ratios = XLK\n")).unwrap_err();
        assert!(matches!(err, SignalframeError::ConfigInvalid { key, .. } if key == "ratios"));
    }

    #[test]
    fn zero_global_lag_fails_but_override_allowed() {
        let err = validate_config(&make_config("[macro]\nseries = CPI\nlag_days = 0\n")).unwrap_err();
        assert!(matches!(err, SignalframeError::ConfigInvalid { key, .. } if key == "lag_days"));

        assert!(validate_config(&make_config("[macro]\nseries = CPI\ncpi_lag = 0\n")).is_ok());
    }

    #[test]
    fn unknown_frequency_fails() {
        let err = validate_config(&make_config("[macro]\nseries = CPI\ncpi_frequency = hourly\n")).unwrap_err();
        assert!(matches!(err, SignalframeError::ConfigInvalid { key, .. } if key == "cpi_frequency"));
    }

    #[test]
    fn spread_over_unknown_series_fails() {
        let err = validate_config(&make_config("[macro]\nseries = DGS10\nspreads = DGS10-DGS2\n")).unwrap_err();
        assert!(matches!(err, SignalframeError::ConfigInvalid { key, .. } if key == "spreads"));
    }

    #[test]
    fn window_too_small_fails() {
        let err = validate_config(&make_config("[windows]\nrolling = 1, 5\n")).unwrap_err();
        assert!(matches!(err, SignalframeError::ConfigInvalid { key, .. } if key == "rolling"));
    }

    #[test]
    fn duplicate_window_fails() {
        let err = validate_config(&make_config("[windows]\nreturns = 5, 5\n")).unwrap_err();
        assert!(matches!(err, SignalframeError::ConfigInvalid { key, .. } if key == "returns"));
    }

    #[test]
    fn non_numeric_window_fails() {
        let err = validate_config(&make_config("[windows]\nzscore = long\n")).unwrap_err();
        assert!(matches!(err, SignalframeError::ConfigInvalid { key, .. } if key == "zscore"));
    }

    #[test]
    fn unknown_std_kind_fails() {
        let err = validate_config(&make_config("[windows]\nstd = robust\n")).unwrap_err();
        assert!(matches!(err, SignalframeError::ConfigInvalid { key, .. } if key == "std"));
    }

    #[test]
    fn indicator_periods_parse() {
        let config = make_config(
            "[indicators]\nema = 5, 21\nmacd_fast = 8\nmacd_slow = 17\nrsi = 9\nbollinger_std = 2.5\n",
        );
        let spec = parse_indicators(&config).unwrap().unwrap();
        assert_eq!(spec.ema, vec![5, 21]);
        assert_eq!((spec.macd_fast, spec.macd_slow, spec.macd_signal), (8, 17, 9));
        assert_eq!(spec.rsi, 9);
        assert_eq!(spec.bollinger_std, 2.5);
        assert_eq!(spec.atr, 14);
    }

    #[test]
    fn disabled_indicators_parse_to_none() {
        let config = make_config("[indicators]\nenabled = false\nrsi = 0\n");
        assert!(validate_config(&config).is_ok());
        assert_eq!(parse_indicators(&config).unwrap(), None);
    }

    #[test]
    fn macd_fast_not_below_slow_fails() {
        let err = validate_config(&make_config("[indicators]\nmacd_fast = 26\nmacd_slow = 12\n")).unwrap_err();
        assert!(matches!(err, SignalframeError::ConfigInvalid { key, .. } if key == "macd_slow"));
    }

    #[test]
    fn non_positive_band_width_fails() {
        for raw in ["0", "-1", "wide"] {
            let err = validate_config(&make_config(&format!("[indicators]\nbollinger_std = {}\n", raw))).unwrap_err();
            assert!(matches!(err, SignalframeError::ConfigInvalid { key, .. } if key == "bollinger_std"));
        }
    }

    #[test]
    fn zero_rsi_period_fails() {
        let err = validate_config(&make_config("[indicators]\nrsi = 0\n")).unwrap_err();
        assert!(matches!(err, SignalframeError::ConfigInvalid { key, .. } if key == "rsi"));
    }

    #[test]
    fn sentiment_without_scores_fails() {
        let err = validate_config(&make_config("[sentiment]\narticles = news.csv\n")).unwrap_err();
        assert!(matches!(err, SignalframeError::ConfigMissing { key, .. } if key == "scores"));
    }

    #[test]
    fn bad_target_flag_fails() {
        let err = validate_config(&make_config("[output]\ntarget = maybe\n")).unwrap_err();
        assert!(matches!(err, SignalframeError::ConfigInvalid { key, .. } if key == "target"));
    }
}
