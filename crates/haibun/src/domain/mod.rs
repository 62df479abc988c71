//! Domain registry: named value types and the coercers that produce them.
//!
//! Every placeholder declares a domain (`string` when omitted). During
//! variable population the registry decides which coercer turns the raw
//! text into a [`Value`], taking into account unions such as `page|url` and
//! the concrete domain a stored variable was saved with.

mod builtin;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use haibun_patterns::{DEFAULT_DOMAIN, Origin};
use thiserror::Error;

use crate::value::Value;

pub use builtin::{NUMBER_DOMAIN, builtin_domains, parse_finite};

/// Coercion function for a domain.
pub type CoerceFn = Arc<dyn Fn(&str) -> Result<Value, String> + Send + Sync>;

/// A named value type and its coercer.
#[derive(Clone)]
pub struct DomainDefinition {
    name: String,
    coerce: CoerceFn,
    rejects_undefined: bool,
}

impl DomainDefinition {
    /// Define domain `name` with the given coercer.
    ///
    /// # Examples
    ///
    /// ```
    /// use haibun::{DomainDefinition, Value};
    ///
    /// let upper = DomainDefinition::new("upper", |raw| Ok(Value::from(raw.to_uppercase())));
    /// assert_eq!(upper.name(), "upper");
    /// assert_eq!(upper.coerce("ada"), Ok(Value::from("ADA")));
    /// ```
    pub fn new<F>(name: impl Into<String>, coerce: F) -> Self
    where
        F: Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            coerce: Arc::new(coerce),
            rejects_undefined: false,
        }
    }

    /// Fail population instead of skipping when no raw value is available.
    #[must_use]
    pub fn rejecting_undefined(mut self) -> Self {
        self.rejects_undefined = true;
        self
    }

    /// Domain name (a sorted union key for union coercers).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether an undefined raw value is an error for this domain.
    #[must_use]
    pub fn rejects_undefined(&self) -> bool {
        self.rejects_undefined
    }

    /// Run the coercer.
    ///
    /// # Errors
    /// Returns the coercer's message when the raw text is not acceptable.
    pub fn coerce(&self, raw: &str) -> Result<Value, String> {
        (self.coerce)(raw)
    }
}

impl fmt::Debug for DomainDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainDefinition")
            .field("name", &self.name)
            .field("rejects_undefined", &self.rejects_undefined)
            .finish_non_exhaustive()
    }
}

/// Errors raised while registering domains or coercing values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Two domains share a name.
    #[error("domain `{name}` is already registered")]
    DuplicateDomain {
        /// The repeated name.
        name: String,
    },
    /// A stepper requires a domain nobody registered.
    #[error("stepper `{stepper}` requires domain `{domain}`, which is not registered")]
    MissingRequiredDomain {
        /// The missing domain.
        domain: String,
        /// The stepper that requires it.
        stepper: String,
    },
    /// A stored variable's domain disagrees with the declared one.
    #[error("`{label}` is declared as `{declared}` but holds a `{stored}` value")]
    DomainMismatch {
        /// Placeholder label.
        label: String,
        /// Declared domain.
        declared: String,
        /// Domain the stored value carries.
        stored: String,
    },
    /// No coercer is registered under the declared domain.
    #[error("no coercer for domain `{domain}` of `{label}`")]
    NoCoercerFound {
        /// Placeholder label.
        label: String,
        /// Declared domain.
        domain: String,
    },
    /// No coercer is registered for a union and no member could be picked.
    #[error("no coercer for union `{key}` of `{label}`")]
    NoCoercerForUnion {
        /// Placeholder label.
        label: String,
        /// Sorted union key.
        key: String,
    },
    /// The coercer rejected the raw text.
    #[error("cannot coerce `{raw}` to `{domain}` for `{label}`: {message}")]
    CoercionFailed {
        /// Placeholder label.
        label: String,
        /// Domain whose coercer failed.
        domain: String,
        /// Raw text.
        raw: String,
        /// Coercer message.
        message: String,
    },
    /// A `number` value did not parse as a number.
    #[error("`{label}` expects a number, got `{raw}`")]
    InvalidNumber {
        /// Placeholder label.
        label: String,
        /// Raw text.
        raw: String,
    },
}

/// Sorted, `|`-joined key under which a union coercer is registered.
///
/// # Examples
///
/// ```
/// assert_eq!(haibun::union_key("url|page"), "page|url");
/// ```
#[must_use]
pub fn union_key(domain: &str) -> String {
    let mut members: Vec<&str> = domain.split('|').collect();
    members.sort_unstable();
    members.dedup();
    members.join("|")
}

/// Input to a single coercion.
#[derive(Debug, Clone, Copy)]
pub struct CoerceRequest<'a> {
    /// Placeholder label, for error messages.
    pub label: &'a str,
    /// How the raw value was supplied.
    pub origin: Origin,
    /// Raw text to coerce.
    pub raw: &'a str,
    /// Domain declared by the placeholder.
    pub declared: &'a str,
    /// Domain of the stored variable the raw text came from, if any.
    pub stored: Option<&'a str>,
}

/// Result of a successful coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced {
    /// Concrete domain (or union key) that produced the value.
    pub domain: String,
    /// The coerced value.
    pub value: Value,
}

/// Per-run catalogue of domains.
///
/// Built once from the built-ins and the steppers' contributions, then
/// shared read-only.
#[derive(Debug, Clone)]
pub struct DomainRegistry {
    domains: HashMap<String, DomainDefinition>,
}

impl Default for DomainRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainRegistry {
    /// Registry holding the built-in `string`, `number` and `statement`
    /// domains.
    #[must_use]
    pub fn new() -> Self {
        let domains = builtin_domains()
            .into_iter()
            .map(|definition| (definition.name.clone(), definition))
            .collect();
        Self { domains }
    }

    /// Add a domain. Union coercers register under [`union_key`].
    ///
    /// # Errors
    /// Returns [`DomainError::DuplicateDomain`] when the name is taken.
    pub fn register(&mut self, mut definition: DomainDefinition) -> Result<(), DomainError> {
        let key = if definition.name.contains('|') {
            union_key(&definition.name)
        } else {
            definition.name.clone()
        };
        if self.domains.contains_key(&key) {
            return Err(DomainError::DuplicateDomain { name: key });
        }
        log::debug!("registered domain `{key}`");
        definition.name.clone_from(&key);
        self.domains.insert(key, definition);
        Ok(())
    }

    /// Look up a domain by name or union key.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&DomainDefinition> {
        self.domains.get(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.domains.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Check that each of `required` is registered.
    ///
    /// # Errors
    /// Returns [`DomainError::MissingRequiredDomain`] for the first absent
    /// domain.
    pub fn require(&self, stepper: &str, required: &[String]) -> Result<(), DomainError> {
        required
            .iter()
            .find(|name| self.lookup(name).is_none())
            .map_or(Ok(()), |domain| {
                Err(DomainError::MissingRequiredDomain {
                    domain: domain.clone(),
                    stepper: stepper.to_string(),
                })
            })
    }

    /// Whether an undefined raw value for `declared` must fail population.
    #[must_use]
    pub fn rejects_undefined(&self, declared: &str) -> bool {
        let key = if declared.contains('|') {
            union_key(declared)
        } else {
            declared.to_string()
        };
        self.lookup(&key)
            .is_some_and(DomainDefinition::rejects_undefined)
    }

    /// Pick the coercer for a request.
    fn select<'r>(
        &'r self,
        request: &CoerceRequest<'_>,
    ) -> Result<&'r DomainDefinition, DomainError> {
        let declared = request.declared;
        if !declared.contains('|') {
            if let Some(stored) = request.stored {
                if stored != declared {
                    return Err(DomainError::DomainMismatch {
                        label: request.label.to_string(),
                        declared: declared.to_string(),
                        stored: stored.to_string(),
                    });
                }
            }
            return self
                .lookup(declared)
                .ok_or_else(|| DomainError::NoCoercerFound {
                    label: request.label.to_string(),
                    domain: declared.to_string(),
                });
        }

        let mut members = declared.split('|');
        if request.origin == Origin::Quoted && members.any(|member| member == DEFAULT_DOMAIN) {
            if let Some(string) = self.lookup(DEFAULT_DOMAIN) {
                return Ok(string);
            }
        }
        if let Some(stored) = request.stored {
            if declared.split('|').any(|member| member == stored) {
                if let Some(member) = self.lookup(stored) {
                    return Ok(member);
                }
            }
        }
        let key = union_key(declared);
        self.lookup(&key)
            .ok_or_else(|| DomainError::NoCoercerForUnion {
                label: request.label.to_string(),
                key,
            })
    }

    /// Coerce a raw value for a placeholder.
    ///
    /// # Errors
    /// Returns a [`DomainError`] when no coercer applies, the stored domain
    /// conflicts with the declared one, a `number` is malformed or the
    /// coercer rejects the text.
    pub fn coerce(&self, request: &CoerceRequest<'_>) -> Result<Coerced, DomainError> {
        let definition = self.select(request)?;
        Self::run(definition, request.label, request.raw)
    }

    /// Coerce `raw` with the coercer registered for a union.
    ///
    /// # Errors
    /// Returns [`DomainError::NoCoercerForUnion`] when nothing is registered
    /// under the key, or the coercer's failure.
    pub fn coerce_union(&self, key: &str, label: &str, raw: &str) -> Result<Coerced, DomainError> {
        let key = union_key(key);
        let definition = self
            .lookup(&key)
            .ok_or_else(|| DomainError::NoCoercerForUnion {
                label: label.to_string(),
                key: key.clone(),
            })?;
        Self::run(definition, label, raw)
    }

    fn run(
        definition: &DomainDefinition,
        label: &str,
        raw: &str,
    ) -> Result<Coerced, DomainError> {
        if definition.name == NUMBER_DOMAIN && parse_finite(raw).is_none() {
            return Err(DomainError::InvalidNumber {
                label: label.to_string(),
                raw: raw.to_string(),
            });
        }
        let value = definition
            .coerce(raw)
            .map_err(|message| DomainError::CoercionFailed {
                label: label.to_string(),
                domain: definition.name.clone(),
                raw: raw.to_string(),
                message,
            })?;
        Ok(Coerced {
            domain: definition.name.clone(),
            value,
        })
    }
}
