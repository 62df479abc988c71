//! `haibun` binary: run feature files from the command line.
//!
//! Exit codes: 0 when every split passes, 1 when a run fails or cannot
//! start, 2 on invalid configuration.

use std::io;

use clap::Parser;
use tracing::info;

use haibun_cli::cli::Args;
use haibun_cli::config::{CliConfig, LogLevel};
use haibun_cli::error::CliError;
use haibun_cli::logging::init_logging;
use haibun_cli::output::write_report;

fn main() {
    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            init_logging(LogLevel::default());
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };
    init_logging(config.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "starting haibun");

    let result = match haibun_cli::run(&args, &config) {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = ?e, "run could not complete");
            std::process::exit(1);
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = write_report(&mut out, &result, args.json) {
        tracing::error!(error = ?e, "failed to write report");
        std::process::exit(1);
    }
    if !result.ok {
        std::process::exit(1);
    }
}

fn build_config(args: &Args) -> Result<CliConfig, CliError> {
    CliConfig::from_env()?.apply_overrides(args)
}
