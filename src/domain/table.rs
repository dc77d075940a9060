//! Typed feature table keyed by the canonical index, and its missing-value report.

use crate::domain::cell::{Cell, Missing};
use crate::domain::error::SignalframeError;
use crate::domain::feature::{FeatureGroup, FeatureKind};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureColumn {
    pub kind: FeatureKind,
    pub name: String,
    pub cells: Vec<Cell>,
}

impl FeatureColumn {
    pub fn group(&self) -> FeatureGroup {
        self.kind.group()
    }
}

/// One row per canonical date; every column has exactly that many cells and a unique name.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    dates: Vec<NaiveDate>,
    columns: Vec<FeatureColumn>,
    by_name: HashMap<String, usize>,
}

impl FeatureTable {
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        Self {
            dates,
            columns: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    pub fn insert(&mut self, kind: FeatureKind, cells: Vec<Cell>) -> Result<(), SignalframeError> {
        let name = kind.to_string();
        if self.by_name.contains_key(&name) {
            return Err(SignalframeError::DuplicateColumn { name });
        }
        if cells.len() != self.dates.len() {
            return Err(SignalframeError::RowCountMismatch {
                column: name,
                expected: self.dates.len(),
                actual: cells.len(),
            });
        }
        self.by_name.insert(name.clone(), self.columns.len());
        self.columns.push(FeatureColumn { kind, name, cells });
        Ok(())
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&FeatureColumn> {
        self.by_name.get(name).map(|&i| &self.columns[i])
    }

    pub fn row_count(&self) -> usize {
        self.dates.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Stable reorder so columns appear grouped by category, insertion order within a group.
    pub fn sort_by_group(&mut self) {
        self.columns.sort_by_key(|c| c.group());
        self.by_name = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
    }

    /// Re-checks the row-count and naming invariants over the whole table.
    pub fn validate(&self) -> Result<(), SignalframeError> {
        let mut seen = HashSet::with_capacity(self.columns.len());
        for c in &self.columns {
            if !seen.insert(c.name.as_str()) {
                return Err(SignalframeError::DuplicateColumn { name: c.name.clone() });
            }
            if c.cells.len() != self.dates.len() {
                return Err(SignalframeError::RowCountMismatch {
                    column: c.name.clone(),
                    expected: self.dates.len(),
                    actual: c.cells.len(),
                });
            }
        }
        Ok(())
    }

    pub fn missing_report(&self) -> MissingReport {
        let rows = self
            .columns
            .iter()
            .map(MissingReportRow::from_column)
            .collect();
        MissingReport { rows }
    }
}

/// Per-column gap counts, broken down by reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingReportRow {
    pub column: String,
    pub group: FeatureGroup,
    pub rows: usize,
    pub missing: usize,
    pub missing_pct: f64,
    pub no_data: usize,
    pub warmup: usize,
    pub zero_division: usize,
    pub non_positive_price: usize,
    pub scorer_failure: usize,
}

impl MissingReportRow {
    fn from_column(column: &FeatureColumn) -> Self {
        let mut counts: HashMap<Missing, usize> = HashMap::new();
        for reason in column.cells.iter().filter_map(|c| c.missing_reason()) {
            *counts.entry(reason).or_insert(0) += 1;
        }
        let count = |m: Missing| counts.get(&m).copied().unwrap_or(0);
        let rows = column.cells.len();
        let missing: usize = counts.values().sum();
        let missing_pct = if rows == 0 {
            0.0
        } else {
            missing as f64 / rows as f64 * 100.0
        };

        Self {
            column: column.name.clone(),
            group: column.group(),
            rows,
            missing,
            missing_pct,
            no_data: count(Missing::NoData),
            warmup: count(Missing::Warmup),
            zero_division: count(Missing::ZeroDivision),
            non_positive_price: count(Missing::NonPositivePrice),
            scorer_failure: count(Missing::ScorerFailure),
        }
    }

    pub fn count_for(&self, reason: Missing) -> usize {
        match reason {
            Missing::NoData => self.no_data,
            Missing::Warmup => self.warmup,
            Missing::ZeroDivision => self.zero_division,
            Missing::NonPositivePrice => self.non_positive_price,
            Missing::ScorerFailure => self.scorer_failure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingReport {
    pub rows: Vec<MissingReportRow>,
}

impl MissingReport {
    pub fn row(&self, column: &str) -> Option<&MissingReportRow> {
        self.rows.iter().find(|r| r.column == column)
    }

    pub fn total_cells(&self) -> usize {
        self.rows.iter().map(|r| r.rows).sum()
    }

    pub fn total_missing(&self) -> usize {
        self.rows.iter().map(|r| r.missing).sum()
    }

    pub fn missing_pct(&self) -> f64 {
        let total = self.total_cells();
        if total == 0 {
            0.0
        } else {
            self.total_missing() as f64 / total as f64 * 100.0
        }
    }
}
