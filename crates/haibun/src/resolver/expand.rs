//! Expansion of `statement` captures into nested steps.

use haibun_patterns::Origin;

use super::{ResolveError, Resolver};
use crate::collect::SourcedLine;
use crate::feature::{FeatureStep, NestedStatement, StepAction};
use crate::types::{SeqPath, SourceLocation};

/// Deepest statement nesting accepted before expansion gives up.
pub(crate) const MAX_STATEMENT_DEPTH: usize = 16;

/// Hands out sequence paths under a parent step.
#[derive(Debug, Clone)]
struct SeqCursor {
    prefix: SeqPath,
    next: u32,
}

impl SeqCursor {
    fn under(prefix: &SeqPath) -> Self {
        Self {
            prefix: prefix.clone(),
            next: 1,
        }
    }

    fn advance(self) -> (SeqPath, Self) {
        let path = self.prefix.child(self.next);
        let next = self.next.saturating_add(1);
        (path, Self { next, ..self })
    }
}

fn unresolved_step(text: &str, source: &SourceLocation, seq_path: SeqPath, message: String) -> FeatureStep {
    FeatureStep {
        source: source.clone(),
        text: text.to_string(),
        seq_path,
        action: StepAction::unresolved(message),
        nested: Vec::new(),
    }
}

impl Resolver<'_> {
    /// Build the step for `line`, expanding its statement captures.
    pub(super) fn build_step(
        &self,
        action: StepAction,
        line: &SourcedLine,
        seq_path: SeqPath,
        depth: usize,
    ) -> FeatureStep {
        let source = action
            .definition()
            .and_then(|definition| definition.source().cloned())
            .unwrap_or_else(|| line.source.clone());

        let mut cursor = SeqCursor::under(&seq_path);
        let mut nested = Vec::new();
        for capture in action
            .captures
            .iter()
            .filter(|capture| capture.origin == Origin::Statement)
        {
            let (steps, rest) = self.expand_statement(&capture.term, &line.source, cursor, depth + 1);
            cursor = rest;
            nested.push(NestedStatement {
                label: capture.label.clone(),
                steps,
            });
        }

        FeatureStep {
            source,
            text: line.text.clone(),
            seq_path,
            action,
            nested,
        }
    }

    /// Resolve the lines of one statement term.
    ///
    /// Failures do not abort resolution: they become unresolved steps that
    /// fail when executed.
    fn expand_statement(
        &self,
        term: &str,
        location: &SourceLocation,
        cursor: SeqCursor,
        depth: usize,
    ) -> (Vec<FeatureStep>, SeqCursor) {
        if depth > MAX_STATEMENT_DEPTH {
            let (path, cursor) = cursor.advance();
            let err = ResolveError::NestingTooDeep {
                text: term.to_string(),
                location: location.clone(),
            };
            return (vec![unresolved_step(term, location, path, err.to_string())], cursor);
        }

        let lines = match self.statement_lines(term, location) {
            Ok(lines) => lines,
            Err(err) => {
                let (path, cursor) = cursor.advance();
                return (vec![unresolved_step(term, location, path, err.to_string())], cursor);
            }
        };

        let mut cursor = cursor;
        let mut steps = Vec::with_capacity(lines.len());
        for line in &lines {
            let (path, rest) = cursor.advance();
            cursor = rest;
            let step = match self.find_action(&line.text, &line.source) {
                Ok(action) => self.build_step(action, line, path, depth),
                Err(err) => unresolved_step(&line.text, &line.source, path, err.to_string()),
            };
            steps.push(step);
        }
        (steps, cursor)
    }

    /// Split a term into lines, expanding include directives.
    fn statement_lines(
        &self,
        term: &str,
        location: &SourceLocation,
    ) -> Result<Vec<SourcedLine>, ResolveError> {
        let mut lines = Vec::new();
        for text in term.lines().map(str::trim).filter(|text| !text.is_empty()) {
            let line = SourcedLine {
                source: location.clone(),
                text: text.to_string(),
            };
            lines.extend(self.library.expand_line(&line)?);
        }
        Ok(lines)
    }
}
