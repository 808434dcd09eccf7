//! Controller configuration
//!
//! Deserializable with defaults, or loaded from `CINELIST_*` environment
//! variables. Unset variables fall back to defaults; malformed ones are errors.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(String),
    #[error("Invalid {key} value '{value}': {reason}")]
    Invalid { key: String, value: String, reason: String },
}

/// Where optimistic inserts land in the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertAt {
    Front,
    #[default]
    Back,
}

impl FromStr for InsertAt {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "front" => Ok(InsertAt::Front),
            "back" => Ok(InsertAt::Back),
            other => Err(format!("expected 'front' or 'back', got '{}'", other)),
        }
    }
}

/// A bool that also accepts 1/0 and yes/no
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flag(pub bool);

impl FromStr for Flag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Flag(true)),
            "0" | "false" | "no" | "off" => Ok(Flag(false)),
            other => Err(format!("expected a boolean, got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub insert_at: InsertAt,
    /// Also notify on commit, not only on rollback
    pub notify_success: bool,
}

impl ControllerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            insert_at: try_load(&lookup, "CINELIST_INSERT_AT", defaults.insert_at)?,
            notify_success: try_load(&lookup, "CINELIST_NOTIFY_SUCCESS", Flag(defaults.notify_success))?.0,
        })
    }
}

/// Parse `key` if set, otherwise use `default`
pub fn try_load<T: FromStr>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    match lookup(key) {
        Some(value) => value.parse().map_err(|e: T::Err| {
            log::warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key: key.to_string(),
                value,
                reason: e.to_string(),
            }
        }),
        None => {
            log::debug!("{key} not set, using default");
            Ok(default)
        }
    }
}

/// Read a variable that has no sensible default
pub fn require(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::Missing(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ControllerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ControllerConfig::default());
        assert_eq!(config.insert_at, InsertAt::Back);
        assert!(!config.notify_success);
    }

    #[test]
    fn test_reads_environment() {
        let config = ControllerConfig::from_lookup(lookup(&[
            ("CINELIST_INSERT_AT", "Front"),
            ("CINELIST_NOTIFY_SUCCESS", "yes"),
        ]))
        .unwrap();
        assert_eq!(config.insert_at, InsertAt::Front);
        assert!(config.notify_success);
    }

    #[test]
    fn test_invalid_value_is_error() {
        let err = ControllerConfig::from_lookup(lookup(&[("CINELIST_INSERT_AT", "middle")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "CINELIST_INSERT_AT"));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: ControllerConfig = serde_json::from_str(r#"{"insert_at":"front"}"#).unwrap();
        assert_eq!(config.insert_at, InsertAt::Front);
        assert!(!config.notify_success);
    }

    #[test]
    fn test_require() {
        assert_eq!(require(lookup(&[("K", " ")]), "K"), Err(ConfigError::Missing("K".to_string())));
        assert_eq!(require(lookup(&[("K", "v")]), "K"), Ok("v".to_string()));
    }
}
