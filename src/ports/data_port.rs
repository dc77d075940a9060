//! Data access port trait.

use crate::domain::error::SignalframeError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::resample::MacroObservation;
use crate::domain::sentiment::Article;
use chrono::NaiveDate;

/// Raw series as stored. Implementations return records in stored order and
/// leave ordering and duplicate checks to the domain.
pub trait DataPort {
    /// Bars dated within `[start_date, end_date]`.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SignalframeError>;

    /// Every observation of a macro series; history before the run start feeds the forward fill.
    fn fetch_macro(&self, name: &str) -> Result<Vec<MacroObservation>, SignalframeError>;

    /// The configured article feed, with timestamps normalized to calendar days.
    fn fetch_articles(&self) -> Result<Vec<Article>, SignalframeError>;

    fn list_symbols(&self) -> Result<Vec<String>, SignalframeError>;

    /// (first date, last date, row count) of an instrument, `None` if it has no rows.
    fn get_data_range(&self, symbol: &str) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SignalframeError>;
}
