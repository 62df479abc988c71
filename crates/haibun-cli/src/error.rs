//! Error types for the command line runner.

use camino::Utf8PathBuf;
use haibun::config::ConfigError;
use thiserror::Error;

/// Failures before or around a run.
#[derive(Debug, Error)]
pub enum CliError {
    /// An invalid configuration value was provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A `HAIBUN_*` variable or flag could not be parsed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A features or backgrounds directory could not be walked.
    #[error("cannot read {path}: {source}")]
    Discovery {
        /// Directory being walked.
        path: Utf8PathBuf,
        /// Underlying walk error.
        #[source]
        source: walkdir::Error,
    },

    /// A discovered path is not valid UTF-8.
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(String),

    /// A feature file could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// File being read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
