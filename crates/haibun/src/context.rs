//! Named-value stores shared by the steps of a run.
//!
//! A [`Context`] maps labels to [`StoredValue`]s and owns any number of named
//! child contexts. The [`World`] is the per-run root: a cheap-to-clone handle
//! around the shared variables, typed domain contexts (each with an optional
//! "current" pointer) and path-scoped contexts for background objects.
//! Only step actions mutate it.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use haibun_patterns::Origin;
use serde::Serialize;

use crate::value::Value;

/// Key prefix under which credential placeholders are stored.
pub const CREDENTIAL_PREFIX: &str = "__cred_";

/// Shared-context key for a credential name.
///
/// # Examples
///
/// ```
/// assert_eq!(haibun::credential_key("password"), "__cred_password");
/// ```
#[must_use]
pub fn credential_key(name: &str) -> String {
    format!("{CREDENTIAL_PREFIX}{name}")
}

/// A value together with the domain and origin it was stored with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredValue {
    /// The stored value.
    pub value: Value,
    /// Concrete domain of the value, when known.
    pub domain: Option<String>,
    /// How the value was supplied.
    pub origin: Origin,
}

impl StoredValue {
    /// A text value of domain `string`.
    #[must_use]
    pub fn text(text: impl Into<String>, origin: Origin) -> Self {
        Self {
            value: Value::Text(text.into()),
            domain: Some(String::from("string")),
            origin,
        }
    }
}

/// A scoped named-value map with owned child contexts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    name: String,
    values: BTreeMap<String, StoredValue>,
    current: Option<String>,
    children: BTreeMap<String, Context>,
}

impl Context {
    /// Create an empty context.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Context name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store `value` under `label`, replacing any previous value.
    pub fn set(&mut self, label: impl Into<String>, value: StoredValue) {
        self.values.insert(label.into(), value);
    }

    /// Look up `label`.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&StoredValue> {
        self.values.get(label)
    }

    /// Remove `label`, returning its value.
    pub fn remove(&mut self, label: &str) -> Option<StoredValue> {
        if self.current.as_deref() == Some(label) {
            self.current = None;
        }
        self.values.remove(label)
    }

    /// Labels in sorted order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of stored values, excluding children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no values are stored, excluding children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Mutable child context, created on first use.
    pub fn child(&mut self, name: &str) -> &mut Self {
        self.children
            .entry(name.to_string())
            .or_insert_with(|| Self::new(name))
    }

    /// Existing child context.
    #[must_use]
    pub fn child_ref(&self, name: &str) -> Option<&Self> {
        self.children.get(name)
    }

    /// Point "current" at `label`. The label need not exist yet.
    pub fn set_current(&mut self, label: impl Into<String>) {
        self.current = Some(label.into());
    }

    /// Label "current" points at.
    #[must_use]
    pub fn current_label(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Value "current" points at.
    #[must_use]
    pub fn current(&self) -> Option<&StoredValue> {
        self.current.as_deref().and_then(|label| self.get(label))
    }

    /// Drop all values, children and the current pointer.
    pub fn clear(&mut self) {
        self.values.clear();
        self.children.clear();
        self.current = None;
    }
}

#[derive(Debug, Default)]
struct WorldState {
    shared: Context,
    domains: Context,
    paths: Context,
    feature_title: Option<String>,
    scenario_title: Option<String>,
}

/// Per-run root of all contexts.
///
/// Clones share the same state. Locks are held only for the duration of the
/// closures passed to the accessors, never across an `.await`.
#[derive(Debug, Clone)]
pub struct World {
    tag: Arc<str>,
    state: Arc<Mutex<WorldState>>,
}

impl Default for World {
    fn default() -> Self {
        Self::new("default")
    }
}

impl World {
    /// Create a world for the run identified by `tag`.
    #[must_use]
    pub fn new(tag: &str) -> Self {
        let state = WorldState {
            shared: Context::new("shared"),
            domains: Context::new("domains"),
            paths: Context::new("paths"),
            ..WorldState::default()
        };
        Self {
            tag: Arc::from(tag),
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WorldState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Tag of the run owning this world.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Run `f` with the shared variable context.
    pub fn with_shared<R>(&self, f: impl FnOnce(&mut Context) -> R) -> R {
        f(&mut self.lock().shared)
    }

    /// Run `f` with the typed context for `domain`.
    pub fn with_domain<R>(&self, domain: &str, f: impl FnOnce(&mut Context) -> R) -> R {
        f(self.lock().domains.child(domain))
    }

    /// Run `f` with the context scoped to `path`.
    pub fn with_path<R>(&self, path: &str, f: impl FnOnce(&mut Context) -> R) -> R {
        f(self.lock().paths.child(path))
    }

    /// Store a shared variable.
    pub fn set(&self, label: impl Into<String>, value: StoredValue) {
        self.with_shared(|shared| shared.set(label, value));
    }

    /// Clone a shared variable.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<StoredValue> {
        self.with_shared(|shared| shared.get(label).cloned())
    }

    /// Store `value` under `label` in the `domain` context and make it current.
    pub fn set_current(&self, domain: &str, label: &str, value: StoredValue) {
        self.with_domain(domain, |context| {
            context.set(label, value);
            context.set_current(label);
        });
    }

    /// Clone the current value of the `domain` context.
    #[must_use]
    pub fn current(&self, domain: &str) -> Option<StoredValue> {
        self.with_domain(domain, |context| context.current().cloned())
    }

    /// Record the title of the feature being executed.
    pub fn set_feature_title(&self, title: impl Into<String>) {
        self.lock().feature_title = Some(title.into());
    }

    /// Title of the feature being executed.
    #[must_use]
    pub fn feature_title(&self) -> Option<String> {
        self.lock().feature_title.clone()
    }

    /// Record the title of the scenario being executed.
    pub fn set_scenario_title(&self, title: impl Into<String>) {
        self.lock().scenario_title = Some(title.into());
    }

    /// Title of the scenario being executed.
    #[must_use]
    pub fn scenario_title(&self) -> Option<String> {
        self.lock().scenario_title.clone()
    }

    /// Forget everything set by the previous feature.
    pub fn reset_feature(&self) {
        let mut state = self.lock();
        state.shared.clear();
        state.domains.clear();
        state.paths.clear();
        state.feature_title = None;
        state.scenario_title = None;
    }
}
