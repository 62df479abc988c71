//! Feature file discovery.

use std::fs;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use haibun::FeatureSource;
use walkdir::WalkDir;

use crate::error::CliError;

const FEATURE_EXTENSION: &str = "feature";

fn is_feature_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == FEATURE_EXTENSION)
}

/// Recursively collect `.feature` files under `root`, sorted by path.
///
/// Each source records `root` as its base so that backgrounds can be scoped
/// to the directory a feature sits in.
///
/// # Errors
///
/// Returns an error if `root` cannot be walked, a path is not UTF-8, or a
/// file cannot be read.
pub fn discover(root: &Utf8Path) -> Result<Vec<FeatureSource>, CliError> {
    let mut sources = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| CliError::Discovery {
            path: root.to_owned(),
            source,
        })?;
        if !entry.file_type().is_file() || !is_feature_file(entry.path()) {
            continue;
        }
        let path = Utf8PathBuf::from_path_buf(entry.into_path())
            .map_err(|path| CliError::NonUtf8Path(path.display().to_string()))?;
        let content = fs::read_to_string(&path).map_err(|source| CliError::Read {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path, "discovered feature file");
        sources.push(FeatureSource::new(path.as_str(), content, root.as_str()));
    }
    Ok(sources)
}
