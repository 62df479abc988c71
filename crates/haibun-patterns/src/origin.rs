//! Where a captured placeholder value comes from.

use std::fmt;

/// Source of a captured placeholder value, decided by its textual form.
///
/// The order of [`Origin::FORMS`] is the precedence used by the compiled
/// matcher: earlier forms win when several could match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Origin {
    /// Raw text of a `statement` placeholder, expanded into sub-steps.
    Statement,
    /// `{name}`: looked up in the run's env map.
    Env,
    /// `` `name` ``: looked up in the shared context.
    Var,
    /// `[text]`: literal with special meaning to the consuming stepper.
    Special,
    /// `<name>`: looked up under the credential key prefix.
    Credential,
    /// `"text"`: literal.
    Quoted,
    /// Bare text: env, then shared context, then the literal itself.
    Fallthrough,
}

impl Origin {
    /// Delimited forms in match precedence, followed by the bare form.
    pub const FORMS: [Self; 6] = [
        Self::Var,
        Self::Env,
        Self::Special,
        Self::Credential,
        Self::Quoted,
        Self::Fallthrough,
    ];

    /// Return the lower-case name of the origin.
    ///
    /// # Examples
    ///
    /// ```
    /// use haibun_patterns::Origin;
    ///
    /// assert_eq!(Origin::Credential.as_str(), "credential");
    /// ```
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Statement => "statement",
            Self::Env => "env",
            Self::Var => "var",
            Self::Special => "special",
            Self::Credential => "credential",
            Self::Quoted => "quoted",
            Self::Fallthrough => "fallthrough",
        }
    }

    /// Opening and closing delimiters for the form, if it has any.
    pub(crate) const fn delimiters(self) -> Option<(char, char)> {
        match self {
            Self::Var => Some(('`', '`')),
            Self::Env => Some(('{', '}')),
            Self::Special => Some(('[', ']')),
            Self::Credential => Some(('<', '>')),
            Self::Quoted => Some(('"', '"')),
            Self::Statement | Self::Fallthrough => None,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
