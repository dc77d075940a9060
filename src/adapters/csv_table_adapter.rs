//! CSV writer for the feature table and its missing-value report.
//!
//! The table is written wide: `date` then one column per feature, in group order.
//! Missing cells are empty fields, never zero. A `<stem>.schema.csv` sidecar
//! records each column's group.

use crate::domain::error::SignalframeError;
use crate::domain::feature::FeatureGroup;
use crate::domain::table::{FeatureTable, MissingReport};
use crate::ports::table_port::TablePort;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct SchemaRow<'a> {
    column: &'a str,
    group: FeatureGroup,
}

#[derive(Debug, Default)]
pub struct CsvTableAdapter;

impl CsvTableAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn schema_path(output_path: &str) -> PathBuf {
        let path = Path::new(output_path);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "features".to_string());
        path.with_file_name(format!("{}.schema.csv", stem))
    }
}

fn writer_for(path: &Path) -> Result<csv::Writer<fs::File>, SignalframeError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(csv::Writer::from_path(path)?)
}

impl TablePort for CsvTableAdapter {
    fn write_table(&self, table: &FeatureTable, output_path: &str) -> Result<(), SignalframeError> {
        table.validate()?;

        let mut wtr = writer_for(Path::new(output_path))?;
        let mut header = Vec::with_capacity(table.column_count() + 1);
        header.push("date");
        header.extend(table.columns().iter().map(|c| c.name.as_str()));
        wtr.write_record(&header)?;

        for (row, date) in table.dates().iter().enumerate() {
            let mut record = Vec::with_capacity(table.column_count() + 1);
            record.push(date.format("%Y-%m-%d").to_string());
            record.extend(table.columns().iter().map(|c| c.cells[row].to_string()));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;

        let mut schema = writer_for(&Self::schema_path(output_path))?;
        for column in table.columns() {
            schema.serialize(SchemaRow {
                column: &column.name,
                group: column.group(),
            })?;
        }
        schema.flush()?;
        Ok(())
    }

    fn write_missing_report(&self, report: &MissingReport, output_path: &str) -> Result<(), SignalframeError> {
        let mut wtr = writer_for(Path::new(output_path))?;
        for row in &report.rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
