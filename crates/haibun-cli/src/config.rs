//! Runner configuration parsed from environment variables and flags.
//!
//! Run settings come from the `HAIBUN_*` variables understood by
//! [`RunConfig`]; this module adds the log level and layers command line
//! flags over both.

use std::str::FromStr;
use std::time::Duration;

use haibun::RunConfig;
use haibun::config::parse_pairs;

use crate::cli::Args;
use crate::error::CliError;

const LOG_LEVEL: &str = "HAIBUN_LOG_LEVEL";

/// Log level enumeration matching tracing crate levels.
///
/// Defaults to `Info` when not specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Every matching decision and stage transition.
    Trace,
    /// Resolution and population detail.
    Debug,
    /// Run and feature progress.
    #[default]
    Info,
    /// Failed steps and hook trouble.
    Warn,
    /// Only errors.
    Error,
}

impl FromStr for LogLevel {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(CliError::InvalidConfig(format!(
                "unknown log level '{s}', expected one of: trace, debug, info, warn, error"
            ))),
        }
    }
}

impl LogLevel {
    /// Convert to a tracing filter directive string.
    #[must_use]
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Configuration for one invocation.
///
/// # Environment Variables
///
/// - `HAIBUN_LOG_LEVEL`: log level (trace, debug, info, warn, error)
/// - every variable read by [`RunConfig::from_vars`]
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log level.
    pub log_level: LogLevel,
    /// Settings handed to each run.
    pub run: RunConfig,
}

impl CliConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, CliError> {
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from name/value pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an invalid value.
    pub fn from_vars<I>(vars: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars.into_iter().collect();
        let log_level = vars
            .iter()
            .find(|(key, _)| key == LOG_LEVEL)
            .map_or_else(|| Ok(LogLevel::default()), |(_, value)| value.parse())?;
        Ok(Self {
            log_level,
            run: RunConfig::from_vars(vars)?,
        })
    }

    /// Apply command line flags over environment-based settings.
    ///
    /// Boolean flags only ever switch a setting on; `--env` pairs are added
    /// to, and replace, those from `HAIBUN_ENV`.
    ///
    /// # Errors
    ///
    /// Returns an error if an `--env` value is not `name=value`.
    pub fn apply_overrides(mut self, args: &Args) -> Result<Self, CliError> {
        if let Some(level) = args.log_level {
            self.log_level = level;
        }
        for pairs in &args.env {
            self.run.env.extend(parse_pairs("--env", pairs)?);
        }
        self.run.continue_on_score |= args.continue_on_score;
        self.run.stay |= args.stay;
        self.run.build |= args.build;
        if let Some(ms) = args.step_delay_ms {
            self.run.step_delay = (ms > 0).then_some(Duration::from_millis(ms));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rstest::rstest;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    #[rstest]
    #[case("trace", LogLevel::Trace)]
    #[case("Debug", LogLevel::Debug)]
    #[case("INFO", LogLevel::Info)]
    #[case("warning", LogLevel::Warn)]
    #[case("error", LogLevel::Error)]
    fn log_level_parses_case_insensitively(#[case] text: &str, #[case] expected: LogLevel) {
        assert_eq!(text.parse::<LogLevel>().ok(), Some(expected));
    }

    #[test]
    fn log_level_rejects_invalid_values() {
        let Err(err) = "loud".parse::<LogLevel>() else {
            panic!("`loud` should be rejected");
        };
        assert!(err.to_string().contains("unknown log level"));
    }

    #[test]
    fn reads_log_level_alongside_run_settings() {
        let config = CliConfig::from_vars(vars(&[
            ("HAIBUN_LOG_LEVEL", "debug"),
            ("HAIBUN_STAY", "yes"),
        ]))
        .unwrap_or_else(|err| panic!("config should parse: {err}"));
        assert_eq!(config.log_level, LogLevel::Debug);
        assert!(config.run.stay);
    }

    #[test]
    fn invalid_run_settings_are_reported() {
        let result = CliConfig::from_vars(vars(&[("HAIBUN_STEP_DELAY_MS", "soon")]));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn flags_override_environment() {
        let args = Args::parse_from([
            "haibun",
            "features",
            "--env",
            "site=example.org",
            "--env",
            "user=ada,role=admin",
            "--continue-on-score",
            "--step-delay-ms",
            "10",
            "--log-level",
            "warn",
        ]);
        let config = CliConfig::from_vars(vars(&[("HAIBUN_ENV", "site=old.example")]))
            .and_then(|config| config.apply_overrides(&args))
            .unwrap_or_else(|err| panic!("overrides should apply: {err}"));
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.run.env.get("site").map(String::as_str), Some("example.org"));
        assert_eq!(config.run.env.get("role").map(String::as_str), Some("admin"));
        assert!(config.run.continue_on_score);
        assert!(!config.run.stay);
        assert_eq!(config.run.step_delay, Some(Duration::from_millis(10)));
    }

    #[test]
    fn malformed_env_flag_is_rejected() {
        let args = Args::parse_from(["haibun", "features", "--env", "oops"]);
        let result = CliConfig::default().apply_overrides(&args);
        assert!(matches!(result, Err(CliError::Config(_))));
    }
}
