//! Turning a step's captures into typed variables.
//!
//! Each capture's origin decides where its raw text comes from; the domain
//! registry then coerces the text. Results are keyed by placeholder label.

use std::collections::BTreeMap;

use derive_more::Deref;
use haibun_patterns::{Capture, Origin};
use serde::Serialize;
use thiserror::Error;

use crate::context::{World, credential_key};
use crate::domain::{CoerceRequest, DomainError, DomainRegistry};
use crate::feature::FeatureStep;
use crate::value::Value;

/// A capture after lookup and coercion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulatedValue {
    /// Placeholder label.
    pub label: String,
    /// Text captured from the line.
    pub term: String,
    /// How the text was written.
    pub origin: Origin,
    /// Domain that produced the value.
    pub domain: String,
    /// Coerced value.
    pub value: Value,
}

/// Populated values of one step, by label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deref)]
pub struct Variables(BTreeMap<String, PopulatedValue>);

impl Variables {
    fn insert(&mut self, value: PopulatedValue) {
        self.0.insert(value.label.clone(), value);
    }
}

/// Errors raised while populating a step's variables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PopulateError {
    /// A `` `name` `` reference is not set in the shared context.
    #[error("`{label}` refers to variable `{name}`, which is not set")]
    MissingVariable {
        /// Placeholder label.
        label: String,
        /// Referenced variable.
        name: String,
    },
    /// A `{name}` reference is not in the run's env map.
    #[error(
        "`{label}` refers to env var `{name}`, which is not set; \
         pass it with HAIBUN_ENV={name}=... or --env {name}=..."
    )]
    MissingEnvVar {
        /// Placeholder label.
        label: String,
        /// Referenced env key.
        name: String,
    },
    /// A `<name>` credential is missing and its domain rejects undefined.
    #[error("`{label}` refers to credential `{name}`, which is not set")]
    MissingCredential {
        /// Placeholder label.
        label: String,
        /// Referenced credential.
        name: String,
    },
    /// Coercion failed.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Raw text for a capture plus the domain of any stored value it came from.
struct Lookup {
    raw: Option<String>,
    stored: Option<String>,
}

impl Lookup {
    fn literal(term: &str) -> Self {
        Self {
            raw: Some(term.to_string()),
            stored: None,
        }
    }
}

fn lookup(
    capture: &Capture,
    world: &World,
    env: &BTreeMap<String, String>,
) -> Result<Lookup, PopulateError> {
    let term = capture.term.as_str();
    match capture.origin {
        Origin::Statement | Origin::Quoted | Origin::Special => Ok(Lookup::literal(term)),
        Origin::Env => env
            .get(term)
            .map(|value| Lookup::literal(value))
            .ok_or_else(|| PopulateError::MissingEnvVar {
                label: capture.label.clone(),
                name: term.to_string(),
            }),
        Origin::Var => world
            .get(term)
            .map(|stored| Lookup {
                raw: Some(stored.value.to_string()),
                stored: stored.domain,
            })
            .ok_or_else(|| PopulateError::MissingVariable {
                label: capture.label.clone(),
                name: term.to_string(),
            }),
        Origin::Credential => Ok(Lookup {
            raw: world
                .get(&credential_key(term))
                .map(|stored| stored.value.to_string()),
            stored: None,
        }),
        Origin::Fallthrough => {
            if let Some(value) = env.get(term) {
                return Ok(Lookup::literal(value));
            }
            Ok(world.get(term).map_or_else(
                || Lookup::literal(term),
                |stored| Lookup {
                    raw: Some(stored.value.to_string()),
                    stored: stored.domain,
                },
            ))
        }
    }
}

/// Resolve and coerce every capture of `step`.
///
/// # Errors
/// Returns the first [`PopulateError`]; the step should then fail without
/// running its action.
pub fn populate(
    step: &FeatureStep,
    world: &World,
    domains: &DomainRegistry,
    env: &BTreeMap<String, String>,
) -> Result<Variables, PopulateError> {
    let mut variables = Variables::default();
    for capture in &step.action.captures {
        let Lookup { raw, stored } = lookup(capture, world, env)?;
        let Some(raw) = raw else {
            if domains.rejects_undefined(&capture.domain) {
                return Err(PopulateError::MissingCredential {
                    label: capture.label.clone(),
                    name: capture.term.clone(),
                });
            }
            log::debug!("{}: `{}` is undefined, skipping", step.seq_path, capture.label);
            continue;
        };
        let coerced = domains.coerce(&CoerceRequest {
            label: &capture.label,
            origin: capture.origin,
            raw: &raw,
            declared: &capture.domain,
            stored: stored.as_deref(),
        })?;
        variables.insert(PopulatedValue {
            label: capture.label.clone(),
            term: capture.term.clone(),
            origin: capture.origin,
            domain: coerced.domain,
            value: coerced.value,
        });
    }
    Ok(variables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StoredValue;
    use crate::feature::StepAction;
    use crate::types::{SeqPath, SourceLocation};
    use rstest::{fixture, rstest};

    fn step_with(captures: Vec<Capture>) -> FeatureStep {
        let mut action = StepAction::unresolved(String::new());
        action.captures = captures;
        FeatureStep {
            source: SourceLocation::new("f.feature", 1),
            text: String::new(),
            seq_path: SeqPath::from(vec![1, 1]),
            action,
            nested: Vec::new(),
        }
    }

    fn capture(label: &str, term: &str, origin: Origin, domain: &str) -> Capture {
        Capture {
            label: label.to_string(),
            term: term.to_string(),
            origin,
            domain: domain.to_string(),
        }
    }

    #[fixture]
    fn world() -> World {
        let world = World::new("test");
        world.set("who", StoredValue::text("ada", Origin::Quoted));
        world.set(
            "count",
            StoredValue {
                value: Value::Number(3.0),
                domain: Some("number".into()),
                origin: Origin::Quoted,
            },
        );
        world
    }

    fn env() -> BTreeMap<String, String> {
        BTreeMap::from([("site".to_string(), "example.org".to_string())])
    }

    fn populate_one(world: &World, capture: Capture) -> Result<Variables, PopulateError> {
        populate(&step_with(vec![capture]), world, &DomainRegistry::new(), &env())
    }

    fn text_of(variables: &Variables, label: &str) -> Option<String> {
        variables.get(label).map(|populated| populated.value.to_string())
    }

    #[rstest]
    #[case::quoted(Origin::Quoted, "who", "who")]
    #[case::special(Origin::Special, "who", "who")]
    #[case::var(Origin::Var, "who", "ada")]
    #[case::env(Origin::Env, "site", "example.org")]
    #[case::fallthrough_env(Origin::Fallthrough, "site", "example.org")]
    #[case::fallthrough_var(Origin::Fallthrough, "who", "ada")]
    #[case::fallthrough_literal(Origin::Fallthrough, "nobody", "nobody")]
    fn origins_pick_their_source(
        world: World,
        #[case] origin: Origin,
        #[case] term: &str,
        #[case] expected: &str,
    ) {
        let variables = populate_one(&world, capture("x", term, origin, "string"))
            .unwrap_or_else(|err| panic!("should populate: {err}"));
        assert_eq!(text_of(&variables, "x").as_deref(), Some(expected));
    }

    #[rstest]
    fn missing_references_fail(world: World) {
        let missing_var = populate_one(&world, capture("x", "nope", Origin::Var, "string"));
        assert!(matches!(missing_var, Err(PopulateError::MissingVariable { .. })));
        let missing_env = populate_one(&world, capture("x", "nope", Origin::Env, "string"))
            .err()
            .unwrap_or_else(|| panic!("missing env should fail"));
        assert!(missing_env.to_string().contains("--env nope="));
    }

    #[rstest]
    fn undefined_credentials_are_skipped_unless_rejected(world: World) {
        let skipped = populate_one(&world, capture("pw", "secret", Origin::Credential, "string"))
            .unwrap_or_else(|err| panic!("should skip: {err}"));
        assert!(skipped.get("pw").is_none());
        let rejected = populate_one(&world, capture("pin", "pin", Origin::Credential, "number"));
        assert!(matches!(rejected, Err(PopulateError::MissingCredential { .. })));
        world.set(&credential_key("secret"), StoredValue::text("hunter2", Origin::Quoted));
        let found = populate_one(&world, capture("pw", "secret", Origin::Credential, "string"))
            .unwrap_or_else(|err| panic!("should populate: {err}"));
        assert_eq!(text_of(&found, "pw").as_deref(), Some("hunter2"));
    }

    #[rstest]
    fn stored_domain_is_checked_against_declared(world: World) {
        let mismatch = populate_one(&world, capture("n", "count", Origin::Var, "string"));
        assert!(matches!(
            mismatch,
            Err(PopulateError::Domain(DomainError::DomainMismatch { .. }))
        ));
        let number = populate_one(&world, capture("n", "count", Origin::Var, "number"))
            .unwrap_or_else(|err| panic!("should populate: {err}"));
        assert_eq!(
            number.get("n").and_then(|populated| populated.value.as_number()),
            Some(3.0)
        );
    }

    #[rstest]
    fn statements_keep_their_text(world: World) {
        let variables = populate_one(&world, capture("what", "ok", Origin::Statement, "statement"))
            .unwrap_or_else(|err| panic!("should populate: {err}"));
        let populated = variables.get("what").unwrap_or_else(|| panic!("what is set"));
        assert_eq!(populated.domain, "statement");
        assert_eq!(populated.origin, Origin::Statement);
    }
}
