//! Resolution failures.

use thiserror::Error;

use crate::collect::CollectError;
use crate::registry::RegistryError;
use crate::types::SourceLocation;

/// Errors raised while matching lines to step actions.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No step matches the line.
    #[error("{location}: no step found for `{text}`")]
    NoStepFound {
        /// Line text.
        text: String,
        /// Where the line is.
        location: SourceLocation,
    },
    /// Several steps match and none could be preferred.
    #[error("{location}: `{text}` matches several steps: {}", .candidates.join(", "))]
    AmbiguousMatch {
        /// Line text.
        text: String,
        /// Where the line is.
        location: SourceLocation,
        /// Qualified names of every matching step.
        candidates: Vec<String>,
    },
    /// A background line failed during the pre-pass.
    #[error("background `{path}` does not resolve: {source}")]
    Background {
        /// Background path.
        path: String,
        /// Underlying failure.
        #[source]
        source: Box<ResolveError>,
    },
    /// A step defined during resolution failed to compile.
    #[error(transparent)]
    InvalidStep(#[from] RegistryError),
    /// An include directive could not be expanded.
    #[error(transparent)]
    Include(#[from] CollectError),
    /// Statements expand into statements beyond the nesting limit.
    #[error("{location}: statement `{text}` nests too deeply")]
    NestingTooDeep {
        /// Statement text.
        text: String,
        /// Where the enclosing line is.
        location: SourceLocation,
    },
}
