//! Collecting feature sources and expanding them into resolvable lines.
//!
//! Comments (`#`, `;;`), blank lines and fenced code blocks never reach the
//! resolver. `Backgrounds: a, b` and `Scenarios: c` directives splice in the
//! lines of the named sources. A feature file named `background` applies
//! to every feature in its directory and below.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::types::{FeatureSource, SourceLocation};

/// File stem marking a directory background.
pub const DIRECTORY_BACKGROUND: &str = "background";

/// A line of feature text and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcedLine {
    /// Origin of the line.
    pub source: SourceLocation,
    /// Line text with comments stripped.
    pub text: String,
}

/// Which library an include directive draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeKind {
    /// Named background files.
    Backgrounds,
    /// Other feature files.
    Scenarios,
}

impl fmt::Display for IncludeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Backgrounds => "background",
            Self::Scenarios => "scenario",
        })
    }
}

/// A parsed include directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    /// Library to look in.
    pub kind: IncludeKind,
    /// Source names, in order.
    pub names: Vec<String>,
}

/// Errors from the collect and expand stages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectError {
    /// No runnable feature was supplied.
    #[error("no features to run")]
    NoFeatures,
    /// Two sources share a path.
    #[error("duplicate feature path `{path}`")]
    DuplicatePath {
        /// The repeated path.
        path: String,
    },
    /// An include directive names an unknown source.
    #[error("{location}: no {kind} named `{name}`")]
    MissingInclude {
        /// Library searched.
        kind: IncludeKind,
        /// Name that was not found.
        name: String,
        /// Line holding the directive.
        location: SourceLocation,
    },
    /// Includes refer back to a source already being included.
    #[error("{location}: `{name}` includes itself")]
    IncludeCycle {
        /// Source included twice.
        name: String,
        /// Line holding the directive.
        location: SourceLocation,
    },
}

/// Parse a `Backgrounds:` or `Scenarios:` directive.
///
/// # Examples
///
/// ```
/// use haibun::{IncludeKind, parse_include};
///
/// let include = parse_include("Backgrounds: login, cart").unwrap_or_else(|| panic!());
/// assert_eq!(include.kind, IncludeKind::Backgrounds);
/// assert_eq!(include.names, vec!["login", "cart"]);
/// assert!(parse_include("Scenario: checkout").is_none());
/// ```
#[must_use]
pub fn parse_include(text: &str) -> Option<Include> {
    let (head, rest) = text.split_once(':')?;
    let kind = match head.trim() {
        "Backgrounds" => IncludeKind::Backgrounds,
        "Scenarios" => IncludeKind::Scenarios,
        _ => return None,
    };
    let names = rest
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    Some(Include { kind, names })
}

fn strip_trailing_comment(line: &str) -> &str {
    line.split_once(" ;;")
        .map_or(line, |(head, _)| head.trim_end())
}

/// Resolvable lines of a source, with one-based line numbers.
#[must_use]
pub fn feature_lines(source: &FeatureSource) -> Vec<SourcedLine> {
    let mut in_fence = false;
    let mut lines = Vec::new();
    for (index, raw) in source.content.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence
            || trimmed.is_empty()
            || trimmed.starts_with('#')
            || trimmed.starts_with(";;")
        {
            continue;
        }
        let text = strip_trailing_comment(trimmed);
        if text.is_empty() {
            continue;
        }
        lines.push(SourcedLine {
            source: SourceLocation::new(&source.path, index + 1),
            text: text.to_string(),
        });
    }
    lines
}

/// Sources include directives can name.
#[derive(Debug, Clone, Default)]
pub struct SourceLibrary {
    backgrounds: Vec<FeatureSource>,
    scenarios: Vec<FeatureSource>,
}

impl SourceLibrary {
    /// Library over named backgrounds and includable features.
    #[must_use]
    pub fn new(backgrounds: Vec<FeatureSource>, scenarios: Vec<FeatureSource>) -> Self {
        Self {
            backgrounds,
            scenarios,
        }
    }

    /// Named backgrounds.
    #[must_use]
    pub fn backgrounds(&self) -> &[FeatureSource] {
        &self.backgrounds
    }

    fn find(&self, kind: IncludeKind, name: &str) -> Option<&FeatureSource> {
        let sources = match kind {
            IncludeKind::Backgrounds => &self.backgrounds,
            IncludeKind::Scenarios => &self.scenarios,
        };
        let name = name.strip_suffix(".feature").unwrap_or(name);
        sources.iter().find(|source| {
            source.name() == name
                || source.path == name
                || source
                    .path
                    .strip_suffix(".feature")
                    .is_some_and(|stem| stem.ends_with(&format!("/{name}")))
        })
    }

    /// Expand `line` if it is an include directive, else return it as is.
    ///
    /// # Errors
    /// Returns [`CollectError`] when a named source is missing or includes
    /// itself.
    pub fn expand_line(&self, line: &SourcedLine) -> Result<Vec<SourcedLine>, CollectError> {
        parse_include(&line.text).map_or_else(
            || Ok(vec![line.clone()]),
            |include| self.include(&include, &line.source, &mut Vec::new()),
        )
    }

    fn include(
        &self,
        include: &Include,
        location: &SourceLocation,
        stack: &mut Vec<String>,
    ) -> Result<Vec<SourcedLine>, CollectError> {
        let mut lines = Vec::new();
        for name in &include.names {
            let source =
                self.find(include.kind, name)
                    .ok_or_else(|| CollectError::MissingInclude {
                        kind: include.kind,
                        name: name.clone(),
                        location: location.clone(),
                    })?;
            if stack.contains(&source.path) {
                return Err(CollectError::IncludeCycle {
                    name: name.clone(),
                    location: location.clone(),
                });
            }
            stack.push(source.path.clone());
            for line in feature_lines(source) {
                match parse_include(&line.text) {
                    Some(inner) => lines.extend(self.include(&inner, &line.source, stack)?),
                    None => lines.push(line),
                }
            }
            stack.pop();
        }
        Ok(lines)
    }
}

/// Runnable features separated from directory backgrounds.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    /// Features to run.
    pub features: Vec<FeatureSource>,
    /// `background` files scoped to their directory.
    pub directory_backgrounds: Vec<FeatureSource>,
}

/// Validate feature sources and set directory backgrounds aside.
///
/// # Errors
/// Returns [`CollectError::DuplicatePath`] for repeated paths and
/// [`CollectError::NoFeatures`] when nothing runnable remains.
pub fn collect(sources: Vec<FeatureSource>) -> Result<Collected, CollectError> {
    {
        let mut seen = HashSet::new();
        if let Some(duplicate) = sources.iter().find(|source| !seen.insert(source.path.as_str())) {
            return Err(CollectError::DuplicatePath {
                path: duplicate.path.clone(),
            });
        }
    }
    let (directory_backgrounds, features): (Vec<_>, Vec<_>) = sources
        .into_iter()
        .partition(|source| source.name() == DIRECTORY_BACKGROUND);
    if features.is_empty() {
        return Err(CollectError::NoFeatures);
    }
    log::debug!(
        "collected {} features and {} directory backgrounds",
        features.len(),
        directory_backgrounds.len()
    );
    Ok(Collected {
        features,
        directory_backgrounds,
    })
}

/// A feature with backgrounds and includes spliced in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedFeature {
    /// Feature file path.
    pub path: String,
    /// Root the feature was discovered under.
    pub base: String,
    /// Lines to resolve, in order.
    pub lines: Vec<SourcedLine>,
}

/// Prepend directory backgrounds (outermost first) and expand includes.
///
/// # Errors
/// Returns [`CollectError`] when an include cannot be satisfied.
pub fn expand(
    collected: &Collected,
    library: &SourceLibrary,
) -> Result<Vec<ExpandedFeature>, CollectError> {
    collected
        .features
        .iter()
        .map(|feature| {
            let mut scoped: Vec<&FeatureSource> = collected
                .directory_backgrounds
                .iter()
                .filter(|background| feature.dir().starts_with(background.dir()))
                .collect();
            scoped.sort_by_key(|background| background.dir().components().count());

            let mut lines = Vec::new();
            for source in scoped.into_iter().chain(std::iter::once(feature)) {
                for line in feature_lines(source) {
                    lines.extend(library.expand_line(&line)?);
                }
            }
            Ok(ExpandedFeature {
                path: feature.path.clone(),
                base: feature.base.clone(),
                lines,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(path: &str, content: &str) -> FeatureSource {
        FeatureSource::new(path, content, "features")
    }

    fn texts(lines: &[SourcedLine]) -> Vec<&str> {
        lines.iter().map(|line| line.text.as_str()).collect()
    }

    #[test]
    fn skips_comments_fences_and_blank_lines() {
        let content = "# title\n\nset a to 1 ;; note\n```\nignored\n```\n;; gone\nshow var a\n";
        let lines = feature_lines(&source("f.feature", content));
        assert_eq!(texts(&lines), vec!["set a to 1", "show var a"]);
        assert_eq!(lines.last().map(|line| line.source.line), Some(8));
    }

    #[test]
    fn directory_backgrounds_apply_outermost_first() {
        let collected = collect(vec![
            source("features/background.feature", "outer"),
            source("features/shop/background.feature", "inner"),
            source("features/shop/cart.feature", "cart"),
            source("features/other/background2.feature", "unrelated"),
        ])
        .unwrap_or_else(|err| panic!("collect should succeed: {err}"));
        assert_eq!(collected.directory_backgrounds.len(), 2);
        let expanded = expand(&collected, &SourceLibrary::default())
            .unwrap_or_else(|err| panic!("expand should succeed: {err}"));
        let cart = expanded
            .iter()
            .find(|feature| feature.path.ends_with("cart.feature"))
            .unwrap_or_else(|| panic!("cart should be expanded"));
        assert_eq!(texts(&cart.lines), vec!["outer", "inner", "cart"]);
    }

    #[test]
    fn includes_named_backgrounds_recursively() {
        let library = SourceLibrary::new(
            vec![
                source("backgrounds/login.feature", "open login\nBackgrounds: creds"),
                source("backgrounds/creds.feature", "set user to ada"),
            ],
            Vec::new(),
        );
        let collected = collect(vec![source("f.feature", "Backgrounds: login\ncheck")])
            .unwrap_or_else(|err| panic!("collect should succeed: {err}"));
        let expanded = expand(&collected, &library)
            .unwrap_or_else(|err| panic!("expand should succeed: {err}"));
        let lines = &expanded.first().unwrap_or_else(|| panic!("one feature")).lines;
        assert_eq!(texts(lines), vec!["open login", "set user to ada", "check"]);
        assert_eq!(
            lines.first().map(|line| line.source.path.as_str()),
            Some("backgrounds/login.feature")
        );
    }

    #[test]
    fn reports_missing_and_cyclic_includes() {
        let library = SourceLibrary::new(
            vec![source("backgrounds/loop.feature", "Backgrounds: loop")],
            Vec::new(),
        );
        let line = SourcedLine {
            source: SourceLocation::new("f.feature", 1),
            text: "Backgrounds: nowhere".into(),
        };
        assert!(matches!(
            library.expand_line(&line),
            Err(CollectError::MissingInclude { .. })
        ));
        let line = SourcedLine {
            text: "Backgrounds: loop".into(),
            ..line
        };
        assert!(matches!(
            library.expand_line(&line),
            Err(CollectError::IncludeCycle { .. })
        ));
    }

    #[test]
    fn rejects_duplicates_and_empty_sets() {
        let duplicate = collect(vec![source("a.feature", ""), source("a.feature", "")]);
        assert_eq!(
            duplicate.err(),
            Some(CollectError::DuplicatePath {
                path: "a.feature".into()
            })
        );
        let only_background = collect(vec![source("features/background.feature", "x")]);
        assert_eq!(only_background.err(), Some(CollectError::NoFeatures));
    }
}
