//! Output port for the assembled feature table.

use crate::domain::error::SignalframeError;
use crate::domain::table::{FeatureTable, MissingReport};

pub trait TablePort {
    fn write_table(&self, table: &FeatureTable, output_path: &str) -> Result<(), SignalframeError>;

    fn write_missing_report(&self, report: &MissingReport, output_path: &str) -> Result<(), SignalframeError>;
}
