//! Core data types shared across the pipeline.

use std::fmt;

use camino::Utf8Path;
use derive_more::{Deref, From};
use serde::Serialize;

/// Where a step came from: a file path and one-based line number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceLocation {
    /// Path of the feature or background file.
    pub path: String,
    /// One-based line number.
    pub line: usize,
}

impl SourceLocation {
    /// Create a location.
    #[must_use]
    pub fn new(path: impl Into<String>, line: usize) -> Self {
        Self {
            path: path.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.line)
    }
}

/// Hierarchical step address: feature index, step index, then one index per
/// level of statement nesting. All indices are one-based.
///
/// # Examples
///
/// ```
/// use haibun::SeqPath;
///
/// let step = SeqPath::from(vec![1, 3]);
/// assert_eq!(step.child(1).to_string(), "1.3.1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Deref, From, Serialize)]
pub struct SeqPath(Vec<u32>);

impl SeqPath {
    /// Extend this path by one nested index.
    #[must_use]
    pub fn child(&self, index: u32) -> Self {
        let mut segments = self.0.clone();
        segments.push(index);
        Self(segments)
    }

    /// Whether `self` is `other` or nested somewhere below it.
    #[must_use]
    pub fn starts_with(&self, other: &Self) -> bool {
        self.0.starts_with(&other.0)
    }
}

impl fmt::Display for SeqPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.0.iter().map(u32::to_string).collect();
        f.write_str(&rendered.join("."))
    }
}

/// Raw feature or background text handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSource {
    /// File path, used for reporting and background scoping.
    pub path: String,
    /// Full file contents.
    pub content: String,
    /// Root directory the file was discovered under.
    pub base: String,
}

impl FeatureSource {
    /// Create a source record.
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        content: impl Into<String>,
        base: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            base: base.into(),
        }
    }

    /// File stem used to address the source from include directives.
    #[must_use]
    pub fn name(&self) -> &str {
        Utf8Path::new(&self.path)
            .file_stem()
            .unwrap_or(self.path.as_str())
    }

    /// Directory containing the source, or the empty path at the root.
    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        Utf8Path::new(&self.path)
            .parent()
            .unwrap_or_else(|| Utf8Path::new(""))
    }
}
