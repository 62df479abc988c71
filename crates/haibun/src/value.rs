//! Coerced runtime values.

use std::fmt;

use serde::Serialize;

/// A value produced by a domain coercer or stored in a context.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Plain text.
    Text(String),
    /// A finite number.
    Number(f64),
    /// A boolean flag.
    Bool(bool),
    /// Structured data from a custom domain.
    Json(serde_json::Value),
}

impl Value {
    /// Borrow the text of a [`Value::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Return the number of a [`Value::Number`].
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{number}"),
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Json(json) => write!(f, "{json}"),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Self::Number(number)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_whole_numbers_without_fraction() {
        assert_eq!(Value::from(3.0).to_string(), "3");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
    }

    #[test]
    fn serialises_untagged() {
        let json = serde_json::to_string(&Value::from("ada"))
            .unwrap_or_else(|err| panic!("value should serialise: {err}"));
        assert_eq!(json, "\"ada\"");
    }
}
