//! Domains every run starts with.

use haibun_patterns::{DEFAULT_DOMAIN, STATEMENT_DOMAIN};

use super::DomainDefinition;
use crate::value::Value;

/// Name of the built-in numeric domain.
pub const NUMBER_DOMAIN: &str = "number";

/// Parse `raw` as a finite number; `NaN` and infinities are rejected.
#[must_use]
pub fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|number| number.is_finite())
}

/// The `string`, `number` and `statement` domains.
#[must_use]
pub fn builtin_domains() -> Vec<DomainDefinition> {
    vec![
        DomainDefinition::new(DEFAULT_DOMAIN, |raw| Ok(Value::from(raw))),
        DomainDefinition::new(NUMBER_DOMAIN, |raw| {
            parse_finite(raw)
                .map(Value::Number)
                .ok_or_else(|| format!("`{raw}` is not a finite number"))
        })
        .rejecting_undefined(),
        DomainDefinition::new(STATEMENT_DOMAIN, |raw| Ok(Value::from(raw))),
    ]
}
