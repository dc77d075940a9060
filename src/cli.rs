//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

use crate::adapters::cached_data_port::CachedDataPort;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_table_adapter::CsvTableAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::score_file_adapter::ScoreFileAdapter;
use crate::domain::assembler::FeatureAssembler;
use crate::domain::cell::Missing;
use crate::domain::error::SignalframeError;
use crate::domain::inputs::{PipelineInputs, load_inputs};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::plan::FeaturePlan;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::sentiment_port::SentimentScorer;
use crate::ports::table_port::TablePort;

pub const DEFAULT_OUTPUT_PATH: &str = "features.csv";
pub const DEFAULT_REPORT_PATH: &str = "missing_report.csv";

#[derive(Parser, Debug)]
#[command(name = "signalframe", about = "Point-in-time feature table builder for market data")]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the feature table and missing-value report
    Build {
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides [output] path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Overrides [output] report
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
    /// Validate a configuration and print the planned columns
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for the configured instruments
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// List instrument files in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing(&cli.log_level);

    match cli.command {
        Command::Build { config, output, report } => run_build(&config, output.as_ref(), report.as_ref()),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
        Command::ListSymbols { config } => run_list_symbols(&config),
    }
}

fn init_tracing(log_level: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    // A subscriber may already be installed when `run` is called more than once in-process.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn load_plan(config_path: &Path) -> Result<(FileConfigAdapter, FeaturePlan), ExitCode> {
    eprintln!("Loading config from {}", config_path.display());
    let config = load_config(config_path)?;
    let plan = FeaturePlan::from_config(&config).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    Ok((config, plan))
}

/// The data adapter a config describes: `[data] dir`, its UTC offset and the article file.
pub fn data_port_for(config: &dyn ConfigPort, plan: &FeaturePlan) -> CsvAdapter {
    let dir = config.get_string("data", "dir").unwrap_or_default();
    let mut adapter = CsvAdapter::new(PathBuf::from(dir.trim())).with_offset(plan.utc_offset);
    if plan.sentiment.is_some() {
        if let Some(articles) = config.get_string("sentiment", "articles") {
            adapter = adapter.with_articles(PathBuf::from(articles.trim()));
        }
    }
    adapter
}

fn output_path(config: &dyn ConfigPort, key: &str, default: &str, cli_override: Option<&PathBuf>) -> String {
    match cli_override {
        Some(p) => p.display().to_string(),
        None => config
            .get_string("output", key)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| default.to_string()),
    }
}

fn run_build(config_path: &Path, output: Option<&PathBuf>, report: Option<&PathBuf>) -> ExitCode {
    // Stage 1: Load and validate config
    let (config, plan) = match load_plan(config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    // Stage 2: Ports
    let data = data_port_for(&config, &plan);
    let scorer = match plan.sentiment {
        Some(_) => {
            let scores_path = config.get_string("sentiment", "scores").unwrap_or_default();
            match ScoreFileAdapter::from_file(scores_path.trim()) {
                Ok(s) => Some(s),
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            }
        }
        None => None,
    };

    // Stage 3: Load inputs
    eprintln!(
        "Loading {} instruments, {} macro series ({} to {})",
        plan.instruments().len(),
        plan.macros.len(),
        plan.start_date,
        plan.end_date
    );
    let loaded = match load_inputs(&plan, &data, scorer.as_ref().map(|s| s as &dyn SentimentScorer)) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    for skipped in &loaded.skipped {
        eprintln!("warning: skipping {} ({})", skipped.name, skipped.reason);
    }

    // Stage 4: Assemble and audit
    let assembled = match FeatureAssembler::new(&plan).assemble(&loaded.inputs) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 5: Write outputs
    let table_path = output_path(&config, "path", DEFAULT_OUTPUT_PATH, output);
    let report_path = output_path(&config, "report", DEFAULT_REPORT_PATH, report);
    let writer = CsvTableAdapter::new();
    if let Err(e) = writer.write_table(&assembled.table, &table_path) {
        eprintln!("error: failed to write {}: {e}", table_path);
        return (&e).into();
    }
    if let Err(e) = writer.write_missing_report(&assembled.report, &report_path) {
        eprintln!("error: failed to write {}: {e}", report_path);
        return (&e).into();
    }

    // Stage 6: Summary
    let table = &assembled.table;
    eprintln!("\n=== Feature Table ===");
    eprintln!("Benchmark:        {}", plan.benchmark);
    if let (Some(first), Some(last)) = (table.dates().first(), table.dates().last()) {
        eprintln!("Date range:       {} to {}", first, last);
    }
    eprintln!("Rows:             {}", table.row_count());
    eprintln!("Columns:          {}", table.column_count());
    eprintln!("Missing cells:    {:.2}%", assembled.report.missing_pct());
    for reason in Missing::ALL {
        let count: usize = assembled.report.rows.iter().map(|r| r.count_for(reason)).sum();
        if count > 0 {
            eprintln!("  {:<16}{}", reason.label(), count);
        }
    }
    eprintln!("Audited rows:     {}", assembled.audited_dates.len());
    if !loaded.skipped.is_empty() {
        let names: Vec<&str> = loaded.skipped.iter().map(|s| s.name.as_str()).collect();
        eprintln!("Skipped inputs:   {}", names.join(", "));
    }
    eprintln!("\nTable written to {}", table_path);
    eprintln!("Missing report written to {}", report_path);

    ExitCode::SUCCESS
}

/// Column names the plan produces, derived by assembling a one-row synthetic input.
pub fn planned_columns(plan: &FeaturePlan) -> Result<Vec<(String, String)>, SignalframeError> {
    let bar = |symbol: &str, date: NaiveDate| OhlcvBar::new(symbol, date, 1.0, 1.0, 1.0, 1.0, Some(1.0));
    let inputs = PipelineInputs {
        benchmark: vec![bar(&plan.benchmark, plan.start_date)],
        peers: plan
            .peers
            .iter()
            .map(|p| (p.clone(), vec![bar(p, plan.start_date)]))
            .collect(),
        ..Default::default()
    };
    let table = FeatureAssembler::new(plan).build(&inputs)?;
    Ok(table
        .columns()
        .iter()
        .map(|c| (c.name.clone(), c.group().to_string()))
        .collect())
}

fn run_validate(config_path: &Path) -> ExitCode {
    let (_config, plan) = match load_plan(config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    eprintln!("Config validated successfully");

    eprintln!("\nUniverse:");
    eprintln!("  benchmark: {}", plan.benchmark);
    if !plan.peers.is_empty() {
        eprintln!("  peers:     {}", plan.peers.join(", "));
    }
    if !plan.macros.is_empty() {
        eprintln!("\nMacro series:");
        for spec in &plan.macros {
            eprintln!("  {} ({}, lag {} days)", spec.name, spec.frequency, spec.lag_days);
        }
        for name in plan.same_day_macros() {
            eprintln!("warning: {} has lag 0; its values are used on their own effective date", name);
        }
    }
    match &plan.indicators {
        Some(spec) => eprintln!(
            "\nIndicators: ema {:?}, macd {}/{}/{}, rsi {}, stochastic {}/{}, bollinger {}x{}, atr {}",
            spec.ema,
            spec.macd_fast,
            spec.macd_slow,
            spec.macd_signal,
            spec.rsi,
            spec.stochastic_k,
            spec.stochastic_d,
            spec.bollinger,
            spec.bollinger_std,
            spec.atr
        ),
        None => eprintln!("\nIndicators: disabled"),
    }

    let columns = match planned_columns(&plan) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("\nPlanned columns:");
    for (name, group) in &columns {
        println!("{}\t{}", name, group);
    }
    eprintln!("\n{} columns planned", columns.len());
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, symbol: Option<&str>) -> ExitCode {
    let (config, plan) = match load_plan(config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let adapter = CachedDataPort::new(data_port_for(&config, &plan));

    let symbols: Vec<String> = match symbol {
        Some(s) => vec![s.to_string()],
        None => plan.instruments().into_iter().map(String::from).collect(),
    };

    for s in &symbols {
        match adapter.get_data_range(s) {
            Ok(Some((first, last, count))) => println!("{}: {} bars, {} to {}", s, count, first, last),
            Ok(None) => {
                eprintln!("{}: no data found", s);
                continue;
            }
            Err(e) => {
                eprintln!("error querying {}: {}", s, e);
                continue;
            }
        }
        match benchmark_coverage(&adapter, &plan, s) {
            Ok((covered, total)) => println!("  covers {}/{} benchmark dates in window", covered, total),
            Err(e) => eprintln!("  coverage unavailable: {}", e),
        }
    }
    debug!(hits = adapter.hits(), entries = adapter.len(), "info data cache");

    if symbol.is_none() {
        for spec in &plan.macros {
            match adapter.fetch_macro(&spec.name) {
                Ok(obs) => match (obs.iter().map(|o| o.effective_date).min(), obs.iter().map(|o| o.effective_date).max()) {
                    (Some(first), Some(last)) => {
                        println!("{}: {} observations, {} to {}", spec.name, obs.len(), first, last)
                    }
                    _ => eprintln!("{}: no data found", spec.name),
                },
                Err(e) => eprintln!("error querying {}: {}", spec.name, e),
            }
        }
    }
    ExitCode::SUCCESS
}

/// How many of the benchmark's dates in the plan window `symbol` has a bar for.
///
/// Reads the benchmark window on every call; pass a [`CachedDataPort`] to read it once.
pub fn benchmark_coverage(
    data: &dyn DataPort,
    plan: &FeaturePlan,
    symbol: &str,
) -> Result<(usize, usize), SignalframeError> {
    let benchmark = data.fetch_ohlcv(&plan.benchmark, plan.start_date, plan.end_date)?;
    let dates: HashSet<NaiveDate> = data
        .fetch_ohlcv(symbol, plan.start_date, plan.end_date)?
        .iter()
        .map(|b| b.date)
        .collect();
    let covered = benchmark.iter().filter(|b| dates.contains(&b.date)).count();
    Ok((covered, benchmark.len()))
}

fn run_list_symbols(config_path: &Path) -> ExitCode {
    let (config, plan) = match load_plan(config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let symbols = match data_port_for(&config, &plan).list_symbols() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if symbols.is_empty() {
        eprintln!("No instrument files found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}
