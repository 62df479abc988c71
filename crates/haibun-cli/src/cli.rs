//! Command line arguments for the `haibun` binary.

use camino::Utf8PathBuf;
use clap::Parser;

use crate::config::LogLevel;

/// Run haibun features with the built-in steppers.
#[derive(Parser, Debug)]
#[command(name = "haibun", version, about)]
pub struct Args {
    /// Directory searched recursively for `.feature` files.
    pub features: Utf8PathBuf,
    /// Directory of background files available to include directives.
    #[arg(long, value_name = "DIR")]
    pub backgrounds: Option<Utf8PathBuf>,
    /// Env values for `{name}` placeholders, as `name=value[,name=value]`.
    #[arg(long, value_name = "NAME=VALUE")]
    pub env: Vec<String>,
    /// Keep going past failures that carry a score.
    #[arg(long)]
    pub continue_on_score: bool,
    /// Leave steppers open after the run.
    #[arg(long)]
    pub stay: bool,
    /// Run build handlers before executing.
    #[arg(long)]
    pub build: bool,
    /// Pause between steps, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub step_delay_ms: Option<u64>,
    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<LogLevel>,
    /// Emit JSON instead of a text summary.
    #[arg(long)]
    pub json: bool,
}
