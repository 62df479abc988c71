//! Run configuration.
//!
//! Settings come from `HAIBUN_*` variables and may be layered over by a
//! front end. Stepper options use `HAIBUN_O_<STEPPER>_<OPTION>`.

use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;

const ENV: &str = "HAIBUN_ENV";
const ENV_VARIANTS: &str = "HAIBUN_ENVC";
const CONTINUE_ON_SCORE: &str = "HAIBUN_CONTINUE_ON_SCORE";
const STAY: &str = "HAIBUN_STAY";
const BUILD: &str = "HAIBUN_BUILD";
const STEP_DELAY_MS: &str = "HAIBUN_STEP_DELAY_MS";
const OPTION_PREFIX: &str = "HAIBUN_O_";

/// Tag of a run without env variants.
pub const DEFAULT_TAG: &str = "default";

/// An invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable holds a value that cannot be parsed.
    #[error("invalid value `{value}` for {key}: {reason}")]
    Invalid {
        /// Variable or flag name.
        key: String,
        /// Offending value.
        value: String,
        /// What was expected.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &str, value: &str, reason: &str) -> Self {
        Self::Invalid {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Parse the lenient boolean spellings accepted in `HAIBUN_*` flags.
#[must_use]
pub fn parse_env_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "True" | "yes" | "YES" | "Yes" | "on" | "ON" | "On" => Some(true),
        "0" | "false" | "FALSE" | "False" | "no" | "NO" | "No" | "off" | "OFF" | "Off" => {
            Some(false)
        }
        _ => None,
    }
}

/// Parse `k=v,k2=v2` into pairs, keeping repeated keys.
///
/// # Errors
/// Returns [`ConfigError::Invalid`] for an entry without `=` or with an
/// empty key.
///
/// # Examples
///
/// ```
/// use haibun::config::parse_pairs;
///
/// let pairs = parse_pairs("HAIBUN_ENV", "site=example.org, user=ada")
///     .unwrap_or_else(|err| panic!("{err}"));
/// assert_eq!(pairs.len(), 2);
/// assert!(parse_pairs("HAIBUN_ENV", "oops").is_err());
/// ```
pub fn parse_pairs(key: &str, text: &str) -> Result<Vec<(String, String)>, ConfigError> {
    text.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, value) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::invalid(key, entry, "expected name=value"))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(ConfigError::invalid(key, entry, "empty name"));
            }
            Ok((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_env_bool(value)
        .ok_or_else(|| ConfigError::invalid(key, value, "expected a boolean such as true or 0"))
}

fn option_key(stepper: &str, name: &str) -> String {
    format!("{stepper}_{name}").to_uppercase().replace('-', "_")
}

/// Settings for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// Values for `{name}` placeholders.
    pub env: BTreeMap<String, String>,
    /// Alternative env values; each combination runs as its own split.
    pub env_variants: BTreeMap<String, Vec<String>>,
    /// Stepper options keyed by `STEPPER_OPTION`.
    pub options: BTreeMap<String, String>,
    /// Continue past failures that carry a score.
    pub continue_on_score: bool,
    /// Pause between steps.
    pub step_delay: Option<Duration>,
    /// Skip `end_feature` and `close` hooks, leaving resources open.
    pub stay: bool,
    /// Run build handlers before executing.
    pub build: bool,
}

impl RunConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] when a `HAIBUN_*` value is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Read configuration from name/value pairs, ignoring unrelated names.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] when a `HAIBUN_*` value is malformed.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        for (key, value) in vars {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                ENV => config.env.extend(parse_pairs(key, value)?),
                ENV_VARIANTS => {
                    for (name, variant) in parse_pairs(key, value)? {
                        config.add_variant(&name, &variant);
                    }
                }
                CONTINUE_ON_SCORE => config.continue_on_score = parse_flag(key, value)?,
                STAY => config.stay = parse_flag(key, value)?,
                BUILD => config.build = parse_flag(key, value)?,
                STEP_DELAY_MS => {
                    let millis = value.trim().parse::<u64>().map_err(|_| {
                        ConfigError::invalid(key, value, "expected a whole number of milliseconds")
                    })?;
                    config.step_delay = (millis > 0).then_some(Duration::from_millis(millis));
                }
                _ => {
                    if let Some(option) = key.strip_prefix(OPTION_PREFIX) {
                        config
                            .options
                            .insert(option.to_uppercase(), value.to_string());
                    }
                }
            }
        }
        Ok(config)
    }

    /// Add an alternative value for env key `name`.
    pub fn add_variant(&mut self, name: &str, value: &str) {
        let values = self.env_variants.entry(name.to_string()).or_default();
        if !values.iter().any(|existing| existing == value) {
            values.push(value.to_string());
        }
    }

    /// Set option `name` of `stepper`.
    pub fn set_option(&mut self, stepper: &str, name: &str, value: &str) {
        self.options
            .insert(option_key(stepper, name), value.to_string());
    }

    /// Option `name` of `stepper`, matched case-insensitively.
    #[must_use]
    pub fn option(&self, stepper: &str, name: &str) -> Option<&str> {
        self.options
            .get(&option_key(stepper, name))
            .map(String::as_str)
    }

    /// Name of the variable that sets option `name` of `stepper`.
    #[must_use]
    pub fn option_var(stepper: &str, name: &str) -> String {
        format!("{OPTION_PREFIX}{}", option_key(stepper, name))
    }

    /// One configuration per combination of env variants, each tagged with
    /// its `k=v` choices. Without variants this is the config itself, tagged
    /// [`DEFAULT_TAG`].
    ///
    /// # Examples
    ///
    /// ```
    /// use haibun::RunConfig;
    ///
    /// let mut config = RunConfig::default();
    /// config.add_variant("browser", "firefox");
    /// config.add_variant("browser", "chromium");
    /// config.add_variant("lang", "en");
    /// let tags: Vec<String> = config.splits().into_iter().map(|(tag, _)| tag).collect();
    /// assert_eq!(tags, vec!["browser=firefox,lang=en", "browser=chromium,lang=en"]);
    /// ```
    #[must_use]
    pub fn splits(&self) -> Vec<(String, Self)> {
        let mut combinations: Vec<Vec<(&str, &str)>> = vec![Vec::new()];
        for (name, values) in &self.env_variants {
            combinations = combinations
                .iter()
                .flat_map(|prefix| {
                    values.iter().map(move |value| {
                        let mut next = prefix.clone();
                        next.push((name.as_str(), value.as_str()));
                        next
                    })
                })
                .collect();
        }
        if self.env_variants.is_empty() {
            return vec![(DEFAULT_TAG.to_string(), self.clone())];
        }
        combinations
            .into_iter()
            .map(|choices| {
                let mut split = self.clone();
                split.env_variants.clear();
                let tag: Vec<String> = choices
                    .iter()
                    .map(|(name, value)| format!("{name}={value}"))
                    .collect();
                for (name, value) in choices {
                    split.env.insert(name.to_string(), value.to_string());
                }
                (tag.join(","), split)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parse_env_bool_understands_common_values() {
        for truthy in ["1", "true", "TRUE", "True", "yes", "YES", "Yes", "on", "ON", "On"] {
            assert_eq!(parse_env_bool(truthy), Some(true), "expected {truthy} to be truthy");
        }
        for falsy in ["0", "false", "FALSE", "False", "no", "NO", "No", "off", "OFF", "Off"] {
            assert_eq!(parse_env_bool(falsy), Some(false), "expected {falsy} to be falsy");
        }
        assert_eq!(parse_env_bool("maybe"), None);
    }

    #[test]
    fn reads_every_setting() {
        let config = RunConfig::from_vars([
            ("HAIBUN_ENV", "site=example.org,user=ada"),
            ("HAIBUN_CONTINUE_ON_SCORE", "yes"),
            ("HAIBUN_STAY", "0"),
            ("HAIBUN_BUILD", "on"),
            ("HAIBUN_STEP_DELAY_MS", "25"),
            ("HAIBUN_O_WEB_TIMEOUT", "3000"),
            ("PATH", "/usr/bin"),
        ])
        .unwrap_or_else(|err| panic!("config should parse: {err}"));
        assert_eq!(config.env.get("user").map(String::as_str), Some("ada"));
        assert!(config.continue_on_score);
        assert!(!config.stay);
        assert!(config.build);
        assert_eq!(config.step_delay, Some(Duration::from_millis(25)));
        assert_eq!(config.option("web", "timeout"), Some("3000"));
        assert_eq!(RunConfig::option_var("web", "timeout"), "HAIBUN_O_WEB_TIMEOUT");
    }

    #[rstest]
    #[case::flag("HAIBUN_STAY", "perhaps")]
    #[case::delay("HAIBUN_STEP_DELAY_MS", "soon")]
    #[case::pairs("HAIBUN_ENV", "=x")]
    fn rejects_malformed_values(#[case] key: &str, #[case] value: &str) {
        let err = RunConfig::from_vars([(key, value)])
            .err()
            .unwrap_or_else(|| panic!("{key}={value} should be rejected"));
        assert!(matches!(err, ConfigError::Invalid { key: ref k, .. } if k == key));
    }

    #[test]
    fn variants_form_a_cartesian_product() {
        let config = RunConfig::from_vars([("HAIBUN_ENVC", "a=1,a=2,b=x,b=y,a=1")])
            .unwrap_or_else(|err| panic!("config should parse: {err}"));
        let splits = config.splits();
        let tags: Vec<&str> = splits.iter().map(|(tag, _)| tag.as_str()).collect();
        assert_eq!(tags, vec!["a=1,b=x", "a=1,b=y", "a=2,b=x", "a=2,b=y"]);
        let Some((_, last)) = splits.last() else {
            panic!("expected splits");
        };
        assert_eq!(last.env.get("b").map(String::as_str), Some("y"));
        assert!(last.env_variants.is_empty());
    }

    #[test]
    fn no_variants_means_one_default_split() {
        let splits = RunConfig::default().splits();
        assert_eq!(splits.len(), 1);
        assert_eq!(splits.first().map(|(tag, _)| tag.as_str()), Some(DEFAULT_TAG));
    }
}
