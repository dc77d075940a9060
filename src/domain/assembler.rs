//! Feature assembly.
//!
//! Builds the canonical index from the benchmark, aligns every input onto it, runs
//! the return, ratio and rolling engines, and collects their columns into one
//! [`FeatureTable`]. Before the table is handed out it is validated (row counts,
//! unique names) and audited: sampled rows are re-derived from inputs truncated at
//! that row's date and must match the full run.

use crate::domain::calendar::{AlignedInstrument, CanonicalIndex, align_instrument, reindex};
use crate::domain::cell::{Cell, Missing};
use crate::domain::error::SignalframeError;
use crate::domain::feature::FeatureKind;
use crate::domain::indicator::{IndicatorType, compute_indicators};
use crate::domain::inputs::PipelineInputs;
use crate::domain::ohlcv::PriceField;
use crate::domain::plan::FeaturePlan;
use crate::domain::ratio::{basket_mean, ratio, spread};
use crate::domain::resample::as_of;
use crate::domain::returns::{
    calculate_intraday_returns, calculate_log_returns, calculate_next_day_returns, calculate_overnight_returns,
    calculate_returns,
};
use crate::domain::rolling::{
    breadth_count, realized_volatility, rolling_autocorrelation, rolling_correlation, rolling_kurtosis, rolling_mean,
    rolling_skew, rolling_zscore,
};
use crate::domain::sentiment::sentiment_as_of;
use crate::domain::table::{FeatureTable, MissingReport};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Relative tolerance when comparing a full-run cell with its truncated re-derivation.
pub const CAUSALITY_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct AssembledTable {
    pub table: FeatureTable,
    pub report: MissingReport,
    /// Canonical dates whose rows the causality audit re-derived.
    pub audited_dates: Vec<NaiveDate>,
}

pub struct FeatureAssembler<'a> {
    plan: &'a FeaturePlan,
}

impl<'a> FeatureAssembler<'a> {
    pub fn new(plan: &'a FeaturePlan) -> Self {
        Self { plan }
    }

    /// Build, validate and audit the table, then summarize its gaps.
    pub fn assemble(&self, inputs: &PipelineInputs) -> Result<AssembledTable, SignalframeError> {
        let table = self.compute(inputs, true)?;
        let audited_dates = self.verify_causality(inputs, &table)?;
        let report = table.missing_report();
        info!(
            rows = table.row_count(),
            columns = table.column_count(),
            missing_pct = report.missing_pct(),
            audited = audited_dates.len(),
            "feature table assembled"
        );
        Ok(AssembledTable {
            table,
            report,
            audited_dates,
        })
    }

    /// Build and validate the table without the causality audit.
    pub fn build(&self, inputs: &PipelineInputs) -> Result<FeatureTable, SignalframeError> {
        self.compute(inputs, true)
    }

    /// Re-derives sampled rows from truncated inputs and compares every feature cell.
    ///
    /// Label columns are skipped. Returns the dates that were checked.
    pub fn verify_causality(
        &self,
        inputs: &PipelineInputs,
        table: &FeatureTable,
    ) -> Result<Vec<NaiveDate>, SignalframeError> {
        let positions = sample_positions(table.row_count(), self.plan.causality_samples);
        let mut audited = Vec::with_capacity(positions.len());

        for pos in positions {
            let date = table.dates()[pos];
            let rebuilt = self.compute(&inputs.truncated(date), false)?;
            if rebuilt.row_count() != pos + 1 || rebuilt.dates()[pos] != date {
                return Err(SignalframeError::RowCountMismatch {
                    column: format!("canonical index through {}", date),
                    expected: pos + 1,
                    actual: rebuilt.row_count(),
                });
            }

            for column in table.columns().iter().filter(|c| !c.group().is_label()) {
                let full = column.cells[pos];
                let truncated = rebuilt.column(&column.name).map(|c| c.cells[pos]);
                match truncated {
                    Some(cell) if full.matches(&cell, CAUSALITY_TOLERANCE) => {}
                    other => {
                        return Err(SignalframeError::CausalityViolation {
                            column: column.name.clone(),
                            date,
                            full: describe(full),
                            truncated: other.map(describe).unwrap_or_else(|| "absent".to_string()),
                        });
                    }
                }
            }
            debug!(date = %date, row = pos, "causality audit row matched");
            audited.push(date);
        }

        Ok(audited)
    }

    fn compute(&self, inputs: &PipelineInputs, verbose: bool) -> Result<FeatureTable, SignalframeError> {
        let plan = self.plan;
        let index = CanonicalIndex::from_benchmark(&inputs.benchmark)?;
        if index.is_empty() {
            return Err(SignalframeError::EmptyBenchmark {
                symbol: plan.benchmark.clone(),
            });
        }
        let dates = index.dates();
        let len = index.len();
        let mut table = FeatureTable::new(dates.to_vec());

        // Alignment
        let mut aligned: HashMap<&str, AlignedInstrument> = HashMap::with_capacity(plan.peers.len() + 1);
        aligned.insert(
            plan.benchmark.as_str(),
            align_instrument(&plan.benchmark, &inputs.benchmark, &index)?,
        );
        for symbol in &plan.peers {
            let bars = inputs.peer_bars(symbol).unwrap_or(&[]);
            let peer = align_instrument(symbol, bars, &index)?;
            if verbose && peer.gap_count() > 0 {
                warn!(symbol = %symbol, gaps = peer.gap_count(), rows = len, "peer missing on canonical dates");
            }
            if aligned.insert(symbol.as_str(), peer).is_some() {
                return Err(SignalframeError::DuplicateColumn {
                    name: format!("{}_close", symbol),
                });
            }
        }
        let bench = instrument(&aligned, &plan.benchmark)?;

        // Price
        for field in PriceField::ALL {
            table.insert(
                FeatureKind::Price {
                    symbol: plan.benchmark.clone(),
                    field,
                },
                bench.field(field).to_vec(),
            )?;
        }
        let range_points: Vec<(NaiveDate, Cell)> = inputs.benchmark.iter().map(|b| (b.date, b.range_rel())).collect();
        table.insert(
            FeatureKind::RangeRel {
                symbol: plan.benchmark.clone(),
            },
            reindex(&plan.benchmark, &range_points, dates)?,
        )?;
        for symbol in &plan.peers {
            table.insert(
                FeatureKind::Price {
                    symbol: symbol.clone(),
                    field: PriceField::Close,
                },
                instrument(&aligned, symbol)?.close.clone(),
            )?;
        }

        // Returns
        let mut return_days = vec![1];
        return_days.extend(plan.windows.returns.iter().copied().filter(|&n| n != 1));
        let mut daily: HashMap<&str, Vec<Cell>> = HashMap::new();
        for symbol in plan.instruments() {
            let close = &instrument(&aligned, symbol)?.close;
            for &days in &return_days {
                let returns = calculate_returns(close, days);
                if days == 1 {
                    daily.insert(symbol, returns.clone());
                }
                table.insert(
                    FeatureKind::Return {
                        symbol: symbol.to_string(),
                        days,
                    },
                    returns,
                )?;
            }
            table.insert(
                FeatureKind::LogReturn {
                    symbol: symbol.to_string(),
                },
                calculate_log_returns(close),
            )?;
        }
        let bench_logret = calculate_log_returns(&bench.close);
        table.insert(
            FeatureKind::OvernightReturn {
                symbol: plan.benchmark.clone(),
            },
            calculate_overnight_returns(&bench.open, &bench.close),
        )?;
        table.insert(
            FeatureKind::IntradayReturn {
                symbol: plan.benchmark.clone(),
            },
            calculate_intraday_returns(&bench.open, &bench.close),
        )?;

        // Long-window z-scores are taken of these level columns.
        let mut levels = vec![FeatureKind::Price {
            symbol: plan.benchmark.clone(),
            field: PriceField::Volume,
        }];

        // Ratios
        for (numerator, denominator) in &plan.ratios {
            let kind = FeatureKind::Ratio {
                numerator: numerator.clone(),
                denominator: denominator.clone(),
            };
            table.insert(
                kind.clone(),
                ratio(&instrument(&aligned, numerator)?.close, &instrument(&aligned, denominator)?.close),
            )?;
            levels.push(kind);
        }
        if let Some(baskets) = &plan.baskets {
            let basket = |members: &[String]| -> Result<Vec<Cell>, SignalframeError> {
                let columns = members
                    .iter()
                    .map(|m| {
                        daily.get(m.as_str()).map(Vec::as_slice).ok_or_else(|| SignalframeError::Data {
                            reason: format!("basket member {} is neither the benchmark nor a peer", m),
                        })
                    })
                    .collect::<Result<Vec<&[Cell]>, SignalframeError>>()?;
                Ok(basket_mean(&columns, len))
            };
            let growth = basket(&baskets.growth)?;
            let defensive = basket(&baskets.defensive)?;
            let spread_kind = FeatureKind::BasketSpread {
                long: "growth".into(),
                short: "defensive".into(),
            };
            table.insert(spread_kind.clone(), spread(&growth, &defensive))?;
            table.insert(FeatureKind::BasketReturn { basket: "growth".into() }, growth)?;
            table.insert(
                FeatureKind::BasketReturn {
                    basket: "defensive".into(),
                },
                defensive,
            )?;
            levels.push(spread_kind);
        }

        // Macro
        let mut macro_columns: HashMap<&str, Vec<Cell>> = HashMap::new();
        for spec in &plan.macros {
            let cells = match inputs.macro_series(&spec.name) {
                Some(series) => as_of(series, dates),
                None => {
                    if verbose {
                        warn!(series = %spec.name, "macro series not loaded");
                    }
                    vec![Cell::Missing(Missing::NoData); len]
                }
            };
            let kind = FeatureKind::Macro {
                name: spec.name.clone(),
            };
            table.insert(kind.clone(), cells.clone())?;
            macro_columns.insert(spec.name.as_str(), cells);
            levels.push(kind);
        }
        for (long, short) in &plan.macro_spreads {
            let (Some(a), Some(b)) = (macro_columns.get(long.as_str()), macro_columns.get(short.as_str())) else {
                return Err(SignalframeError::Data {
                    reason: format!("spread {}-{} refers to an unknown macro series", long, short),
                });
            };
            let kind = FeatureKind::MacroSpread {
                long: long.clone(),
                short: short.clone(),
            };
            table.insert(kind.clone(), spread(a, b))?;
            levels.push(kind);
        }

        // Sentiment
        if let Some(spec) = &plan.sentiment {
            let columns = sentiment_as_of(&inputs.sentiment, dates, spec.lag_days);
            table.insert(FeatureKind::Sentiment, columns.mean)?;
            table.insert(FeatureKind::SentimentCount, columns.count)?;
        }

        // Indicators
        let windows = &plan.windows;
        if let Some(spec) = &plan.indicators {
            for (indicator, cells) in compute_indicators(bench, spec, &windows.rolling, windows.std_kind) {
                let kind = FeatureKind::Indicator {
                    symbol: plan.benchmark.clone(),
                    indicator,
                };
                if indicator == IndicatorType::Obv {
                    levels.push(kind.clone());
                }
                table.insert(kind, cells)?;
            }
        }

        // Rolling statistics
        let bench_close = FeatureKind::Price {
            symbol: plan.benchmark.clone(),
            field: PriceField::Close,
        };
        let bench_logret_kind = FeatureKind::LogReturn {
            symbol: plan.benchmark.clone(),
        };
        for &period in &windows.rolling {
            table.insert(FeatureKind::sma(bench_close.clone(), period), rolling_mean(&bench.close, period))?;
            table.insert(
                FeatureKind::zscore(bench_logret_kind.clone(), period),
                rolling_zscore(&bench_logret, period, windows.std_kind),
            )?;
            table.insert(
                FeatureKind::RealizedVol {
                    symbol: plan.benchmark.clone(),
                    period,
                },
                realized_volatility(&bench_logret, period, windows.std_kind),
            )?;
            table.insert(
                FeatureKind::Skew {
                    source: Box::new(bench_logret_kind.clone()),
                    period,
                },
                rolling_skew(&bench_logret, period),
            )?;
            table.insert(
                FeatureKind::Kurtosis {
                    source: Box::new(bench_logret_kind.clone()),
                    period,
                },
                rolling_kurtosis(&bench_logret, period),
            )?;
            table.insert(
                FeatureKind::Autocorr {
                    source: Box::new(bench_logret_kind.clone()),
                    period,
                },
                rolling_autocorrelation(&bench_logret, period, 1),
            )?;
        }
        for kind in levels {
            let Some(source) = table.column(&kind.to_string()) else {
                continue;
            };
            let z = rolling_zscore(&source.cells, windows.zscore, windows.std_kind);
            table.insert(FeatureKind::zscore(kind, windows.zscore), z)?;
        }
        if let Some(bench_daily) = daily.get(plan.benchmark.as_str()) {
            for symbol in &plan.peers {
                if let Some(peer_daily) = daily.get(symbol.as_str()) {
                    table.insert(
                        FeatureKind::Correlation {
                            symbol: symbol.clone(),
                            benchmark: plan.benchmark.clone(),
                            period: windows.correlation,
                        },
                        rolling_correlation(peer_daily, bench_daily, windows.correlation),
                    )?;
                }
            }
        }

        // Breadth
        if !plan.peers.is_empty() {
            let k = windows.breadth;
            let bench_k = calculate_returns(&bench.close, k);
            let peer_k = plan
                .peers
                .iter()
                .map(|s| Ok(calculate_returns(&instrument(&aligned, s)?.close, k)))
                .collect::<Result<Vec<_>, SignalframeError>>()?;
            let peer_refs: Vec<&[Cell]> = peer_k.iter().map(Vec::as_slice).collect();
            table.insert(FeatureKind::Breadth { period: k }, breadth_count(&bench_k, &peer_refs))?;
        }

        // Label
        if plan.include_target {
            table.insert(
                FeatureKind::NextDayReturn {
                    symbol: plan.benchmark.clone(),
                },
                calculate_next_day_returns(&bench.close),
            )?;
        }

        table.sort_by_group();
        table.validate()?;
        if verbose {
            debug!(rows = table.row_count(), columns = table.column_count(), "feature columns computed");
        }
        Ok(table)
    }
}

fn instrument<'b>(
    aligned: &'b HashMap<&str, AlignedInstrument>,
    symbol: &str,
) -> Result<&'b AlignedInstrument, SignalframeError> {
    aligned.get(symbol).ok_or_else(|| SignalframeError::Data {
        reason: format!("{} is neither the benchmark nor a peer", symbol),
    })
}

/// `samples` evenly spaced row positions in `[0, len)`, always ending at the last row.
pub fn sample_positions(len: usize, samples: usize) -> Vec<usize> {
    if len == 0 || samples == 0 {
        return Vec::new();
    }
    let mut positions: Vec<usize> = (1..=samples).map(|k| k * (len - 1) / samples).collect();
    positions.dedup();
    positions
}

fn describe(cell: Cell) -> String {
    match cell {
        Cell::Value(v) => v.to_string(),
        Cell::Missing(reason) => format!("missing ({})", reason.label()),
    }
}
