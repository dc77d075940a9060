//! Typed feature plan: what to compute, built from validated configuration.

use crate::domain::config_validation::{
    self, DEFAULT_BREADTH_WINDOW, DEFAULT_CAUSALITY_SAMPLES, DEFAULT_CORRELATION_WINDOW, DEFAULT_RETURN_WINDOWS,
    DEFAULT_ROLLING_WINDOWS, DEFAULT_ZSCORE_WINDOW,
};
use crate::domain::error::SignalframeError;
use crate::domain::indicator::IndicatorSpec;
use crate::domain::resample::{DEFAULT_LAG_DAYS, Frequency};
use crate::domain::rolling::StdKind;
use crate::domain::sentiment::DEFAULT_MAX_PER_DAY;
use crate::ports::config_port::ConfigPort;
use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct MacroSpec {
    pub name: String,
    pub frequency: Frequency,
    pub lag_days: u32,
}

impl MacroSpec {
    /// Lag 0: a value is visible on its own effective date.
    pub fn is_same_day(&self) -> bool {
        self.lag_days == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Baskets {
    pub growth: Vec<String>,
    pub defensive: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Windows {
    /// N for each N-day return.
    pub returns: Vec<usize>,
    /// Short windows: SMA, return z-scores, realized volatility.
    pub rolling: Vec<usize>,
    /// Long z-score window for levels (ratios, spreads, macro, volume).
    pub zscore: usize,
    pub correlation: usize,
    /// Breadth lookback K.
    pub breadth: usize,
    pub std_kind: StdKind,
}

impl Default for Windows {
    fn default() -> Self {
        Self {
            returns: DEFAULT_RETURN_WINDOWS.to_vec(),
            rolling: DEFAULT_ROLLING_WINDOWS.to_vec(),
            zscore: DEFAULT_ZSCORE_WINDOW,
            correlation: DEFAULT_CORRELATION_WINDOW,
            breadth: DEFAULT_BREADTH_WINDOW,
            std_kind: StdKind::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentimentSpec {
    pub max_per_day: usize,
    pub lag_days: u32,
}

impl Default for SentimentSpec {
    fn default() -> Self {
        Self {
            max_per_day: DEFAULT_MAX_PER_DAY,
            lag_days: DEFAULT_LAG_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeaturePlan {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub utc_offset: FixedOffset,
    pub benchmark: String,
    pub peers: Vec<String>,
    pub baskets: Option<Baskets>,
    pub ratios: Vec<(String, String)>,
    pub macros: Vec<MacroSpec>,
    pub macro_spreads: Vec<(String, String)>,
    pub windows: Windows,
    pub sentiment: Option<SentimentSpec>,
    /// Indicator family for the benchmark; `None` when disabled.
    pub indicators: Option<IndicatorSpec>,
    pub include_target: bool,
    /// Rows re-derived by the causality audit; 0 disables it.
    pub causality_samples: usize,
}

impl FeaturePlan {
    /// A plan with only the benchmark over `[start, end]`, using default windows.
    pub fn new(benchmark: &str, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            utc_offset: Utc.fix(),
            benchmark: benchmark.to_string(),
            peers: Vec::new(),
            baskets: None,
            ratios: Vec::new(),
            macros: Vec::new(),
            macro_spreads: Vec::new(),
            windows: Windows::default(),
            sentiment: None,
            indicators: Some(IndicatorSpec::default()),
            include_target: false,
            causality_samples: DEFAULT_CAUSALITY_SAMPLES,
        }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SignalframeError> {
        config_validation::validate_config(config)?;

        let growth = config.get_list("universe", "growth");
        let defensive = config.get_list("universe", "defensive");
        let baskets = if growth.is_empty() {
            None
        } else {
            Some(Baskets { growth, defensive })
        };

        let global_lag = config_validation::parse_lag(config, "macro", "lag_days")?;
        let macros = config
            .get_list("macro", "series")
            .into_iter()
            .map(|name| {
                Ok(MacroSpec {
                    frequency: config_validation::series_frequency(config, &name)?,
                    lag_days: config_validation::series_lag(config, &name, global_lag)?,
                    name,
                })
            })
            .collect::<Result<Vec<_>, SignalframeError>>()?;
        for spec in macros.iter().filter(|m| m.is_same_day()) {
            warn!(
                series = %spec.name,
                "lag 0 configured: values are visible on their own effective date"
            );
        }

        let windows = Windows {
            returns: config_validation::parse_window_list(config, "windows", "returns", &DEFAULT_RETURN_WINDOWS, 1)?,
            rolling: config_validation::parse_window_list(config, "windows", "rolling", &DEFAULT_ROLLING_WINDOWS, 2)?,
            zscore: config_validation::parse_window(config, "windows", "zscore", DEFAULT_ZSCORE_WINDOW, 2)?,
            correlation: config_validation::parse_window(config, "windows", "correlation", DEFAULT_CORRELATION_WINDOW, 2)?,
            breadth: config_validation::parse_window(config, "windows", "breadth", DEFAULT_BREADTH_WINDOW, 1)?,
            std_kind: config_validation::parse_std_kind(config)?,
        };

        let sentiment = match config.get_string("sentiment", "articles") {
            None => None,
            Some(_) => Some(SentimentSpec {
                max_per_day: config_validation::parse_usize(config, "sentiment", "max_per_day", DEFAULT_MAX_PER_DAY)?,
                lag_days: config_validation::parse_lag(config, "sentiment", "lag_days")?,
            }),
        };

        Ok(Self {
            start_date: config_validation::parse_date(config, "data", "start_date")?,
            end_date: config_validation::parse_date(config, "data", "end_date")?,
            utc_offset: config_validation::parse_offset(config)?,
            benchmark: config_validation::required(config, "universe", "benchmark")?,
            peers: config.get_list("universe", "peers"),
            baskets,
            ratios: config_validation::parse_pairs(config, "universe", "ratios", '/')?,
            macros,
            macro_spreads: config_validation::parse_pairs(config, "macro", "spreads", '-')?,
            windows,
            sentiment,
            indicators: config_validation::parse_indicators(config)?,
            include_target: config_validation::parse_bool(config, "output", "target", false)?,
            causality_samples: config_validation::parse_usize(
                config,
                "output",
                "causality_samples",
                DEFAULT_CAUSALITY_SAMPLES,
            )?,
        })
    }

    /// Macro series configured with same-day attribution.
    pub fn same_day_macros(&self) -> Vec<&str> {
        self.macros
            .iter()
            .filter(|m| m.is_same_day())
            .map(|m| m.name.as_str())
            .collect()
    }

    /// Benchmark first, then peers in configured order.
    pub fn instruments(&self) -> Vec<&str> {
        std::iter::once(self.benchmark.as_str())
            .chain(self.peers.iter().map(String::as_str))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn defaults_from_minimal_config() {
        let config = FileConfigAdapter::from_string(
            "[data]\ndir = data\nstart_date = 2020-01-01\nend_date = 2021-01-01\n[universe]\nbenchmark = SPY\n",
        )
        .unwrap();
        let plan = FeaturePlan::from_config(&config).unwrap();

        assert_eq!(plan, FeaturePlan::new("SPY", d(2020, 1, 1), d(2021, 1, 1)));
        assert_eq!(plan.windows.zscore, 252);
        assert_eq!(plan.windows.returns, vec![5, 10, 20]);
        assert_eq!(plan.instruments(), vec!["SPY"]);
    }

    #[test]
    fn full_config() {
        let config = FileConfigAdapter::from_string(
            "[data]\ndir = data\nstart_date = 2020-01-01\nend_date = 2021-01-01\nutc_offset = -05:00\n\
             [universe]\nbenchmark = SPY\npeers = XLK, XLU\ngrowth = XLK\ndefensive = XLU\nratios = XLK/XLU\n\
             [macro]\nseries = CPI, DGS10, DGS2\nlag_days = 2\ncpi_frequency = monthly\ncpi_lag = 15\n\
             dgs10_frequency = daily\ndgs2_frequency = daily\nspreads = DGS10-DGS2\n\
             [windows]\nreturns = 1,5\nrolling = 10\nstd = sample\nbreadth = 5\n\
             [sentiment]\narticles = news.csv\nscores = scores.csv\nmax_per_day = 3\n\
             [output]\ntarget = yes\ncausality_samples = 0\n",
        )
        .unwrap();
        let plan = FeaturePlan::from_config(&config).unwrap();

        assert_eq!(plan.utc_offset, FixedOffset::west_opt(5 * 3600).unwrap());
        assert_eq!(plan.instruments(), vec!["SPY", "XLK", "XLU"]);
        assert_eq!(
            plan.baskets,
            Some(Baskets {
                growth: vec!["XLK".into()],
                defensive: vec!["XLU".into()]
            })
        );
        assert_eq!(plan.ratios, vec![("XLK".to_string(), "XLU".to_string())]);
        assert_eq!(
            plan.macros[0],
            MacroSpec {
                name: "CPI".into(),
                frequency: Frequency::Monthly,
                lag_days: 15
            }
        );
        assert_eq!(plan.macros[1].frequency, Frequency::Daily);
        assert_eq!(plan.macros[1].lag_days, 2);
        assert_eq!(plan.macro_spreads, vec![("DGS10".to_string(), "DGS2".to_string())]);
        assert_eq!(plan.windows.returns, vec![1, 5]);
        assert_eq!(plan.windows.rolling, vec![10]);
        assert_eq!(plan.windows.std_kind, StdKind::Sample);
        assert_eq!(plan.windows.breadth, 5);
        assert_eq!(
            plan.sentiment,
            Some(SentimentSpec {
                max_per_day: 3,
                lag_days: 1
            })
        );
        assert!(plan.include_target);
        assert_eq!(plan.causality_samples, 0);
    }

    #[test]
    fn zero_series_lag_is_flagged_as_same_day() {
        let config = FileConfigAdapter::from_string(
            "[data]\ndir = data\nstart_date = 2020-01-01\nend_date = 2021-01-01\n[universe]\nbenchmark = SPY\n\
             [macro]\nseries = CPI, DGS10\ndgs10_lag = 0\n",
        )
        .unwrap();
        let plan = FeaturePlan::from_config(&config).unwrap();

        assert!(!plan.macros[0].is_same_day());
        assert!(plan.macros[1].is_same_day());
        assert_eq!(plan.same_day_macros(), vec!["DGS10"]);
    }

    #[test]
    fn indicators_default_on_and_can_be_disabled() {
        let base = "[data]\ndir = data\nstart_date = 2020-01-01\nend_date = 2021-01-01\n[universe]\nbenchmark = SPY\n";
        let plan = FeaturePlan::from_config(&FileConfigAdapter::from_string(base).unwrap()).unwrap();
        assert_eq!(plan.indicators, Some(IndicatorSpec::default()));

        let off = format!("{}[indicators]\nenabled = no\n", base);
        let plan = FeaturePlan::from_config(&FileConfigAdapter::from_string(&off).unwrap()).unwrap();
        assert_eq!(plan.indicators, None);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = FileConfigAdapter::from_string("[universe]\nbenchmark = SPY\n").unwrap();
        assert!(FeaturePlan::from_config(&config).is_err());
    }
}
