//! Backend connection settings

use cinelist::config::{require, try_load, ConfigError};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestConfig {
    /// Project URL, without the `/rest/v1` suffix
    pub base_url: String,
    pub api_key: String,
    pub schema: String,
    pub timeout_secs: u64,
}

impl RestConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            schema: "public".to_string(),
            timeout_secs: 10,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::new(require(&lookup, "CINELIST_REST_URL")?, require(&lookup, "CINELIST_REST_KEY")?);
        let config = Self {
            schema: try_load(&lookup, "CINELIST_REST_SCHEMA", defaults.schema.clone())?,
            timeout_secs: try_load(&lookup, "CINELIST_REST_TIMEOUT_SECS", defaults.timeout_secs)?,
            ..defaults
        };
        log::info!("REST backend at {} (schema {})", config.base_url, config.schema);
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
