//! As-of mapping of lower-frequency series onto the daily canonical index.
//!
//! A value with effective date `E` and reporting lag `L` days first becomes
//! visible on canonical date `E + L`. It then stays visible (forward-filled)
//! until a later observation becomes visible. Dates before the first visible
//! observation are missing.

use crate::domain::cell::{Cell, Missing};
use crate::domain::error::SignalframeError;
use chrono::{Days, NaiveDate};
use std::fmt;

pub const DEFAULT_LAG_DAYS: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
}

impl Frequency {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "daily" | "d" => Some(Frequency::Daily),
            "weekly" | "w" => Some(Frequency::Weekly),
            "monthly" | "m" => Some(Frequency::Monthly),
            "quarterly" | "q" => Some(Frequency::Quarterly),
            _ => None,
        }
    }

    /// Calendar days between consecutive releases under normal conditions.
    pub fn nominal_days(&self) -> i64 {
        match self {
            // Weekends and holidays.
            Frequency::Daily => 4,
            Frequency::Weekly => 7,
            Frequency::Monthly => 31,
            Frequency::Quarterly => 92,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroObservation {
    pub effective_date: NaiveDate,
    /// `None` marks a reported gap; it does not replace the last present value.
    pub value: Option<f64>,
}

/// A lower-frequency series with its release metadata.
///
/// Observations are kept sorted by effective date with no duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroSeries {
    pub name: String,
    pub frequency: Frequency,
    pub lag_days: u32,
    observations: Vec<MacroObservation>,
}

impl MacroSeries {
    pub fn new(
        name: &str,
        frequency: Frequency,
        lag_days: u32,
        mut observations: Vec<MacroObservation>,
    ) -> Result<Self, SignalframeError> {
        observations.sort_by_key(|o| o.effective_date);
        if let Some(pair) = observations
            .windows(2)
            .find(|p| p[0].effective_date == p[1].effective_date)
        {
            return Err(SignalframeError::DuplicateDate {
                series: name.to_string(),
                date: pair[0].effective_date.to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            frequency,
            lag_days,
            observations,
        })
    }

    pub fn observations(&self) -> &[MacroObservation] {
        &self.observations
    }

    /// Only the observations released on or before `through`.
    pub fn truncated(&self, through: NaiveDate) -> MacroSeries {
        MacroSeries {
            name: self.name.clone(),
            frequency: self.frequency,
            lag_days: self.lag_days,
            observations: self
                .observations
                .iter()
                .filter(|o| o.effective_date <= through)
                .copied()
                .collect(),
        }
    }

    /// Consecutive observations further apart than twice the nominal period.
    pub fn stale_gaps(&self) -> Vec<(NaiveDate, NaiveDate)> {
        let limit = 2 * self.frequency.nominal_days();
        self.observations
            .windows(2)
            .filter(|p| (p[1].effective_date - p[0].effective_date).num_days() > limit)
            .map(|p| (p[0].effective_date, p[1].effective_date))
            .collect()
    }
}

/// Maps `series` onto `index` (sorted ascending) without look-ahead.
pub fn as_of(series: &MacroSeries, index: &[NaiveDate]) -> Vec<Cell> {
    let observations = series.observations();
    let lag = Days::new(u64::from(series.lag_days));
    let mut next = 0;
    let mut visible: Option<f64> = None;

    index
        .iter()
        .map(|&date| {
            let Some(cutoff) = date.checked_sub_days(lag) else {
                return Cell::Missing(Missing::NoData);
            };
            while next < observations.len() && observations[next].effective_date <= cutoff {
                if let Some(v) = observations[next].value.filter(|v| v.is_finite()) {
                    visible = Some(v);
                }
                next += 1;
            }
            Cell::from_option(visible)
        })
        .collect()
}
