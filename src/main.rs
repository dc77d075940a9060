use clap::Parser;
use signalframe::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
