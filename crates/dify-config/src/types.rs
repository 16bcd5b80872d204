//! Client configuration types.
//!
//! ```toml
//! host = "https://api.dify.ai"
//! api_key = "app-..."
//! user = "alice"
//! timeout_secs = 30
//! stream_timeout_secs = 300
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Environment variable overriding `host`.
pub const HOST_ENV: &str = "DIFY_HOST";

/// Environment variable overriding `api_key`.
pub const API_KEY_ENV: &str = "DIFY_API_KEY";

/// Environment variable overriding `user`.
pub const USER_ENV: &str = "DIFY_USER";

/// Host used when none is configured.
pub const DEFAULT_HOST: &str = "https://api.dify.ai";

/// End-user id used when none is configured.
pub const DEFAULT_USER: &str = "dify-cli";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STREAM_TIMEOUT_SECS: u64 = 300;

/// Client configuration as written in a config file. Every field is optional
/// so that layers can be merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Server URL, with or without the `/v1` suffix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// App API key (`app-...`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// End-user identifier sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Timeout for non-streaming requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Upper bound on a whole streaming response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_timeout_secs: Option<u64>,
}

/// Fully resolved settings, ready to build a client from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub host: String,
    pub api_key: String,
    pub user: String,
    pub timeout: Duration,
    pub stream_timeout: Duration,
}

impl ClientConfig {
    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Overlay `other` on top of `self`; set fields in `other` win.
    pub fn merge(&mut self, other: ClientConfig) {
        if other.host.is_some() {
            self.host = other.host;
        }
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.user.is_some() {
            self.user = other.user;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.stream_timeout_secs.is_some() {
            self.stream_timeout_secs = other.stream_timeout_secs;
        }
    }

    /// Apply `DIFY_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup. Empty values are ignored.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        if let Some(host) = get(HOST_ENV) {
            self.host = Some(host);
        }
        if let Some(key) = get(API_KEY_ENV) {
            self.api_key = Some(key);
        }
        if let Some(user) = get(USER_ENV) {
            self.user = Some(user);
        }
    }

    /// Whether the config stores an API key in plain text.
    pub fn has_plaintext_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Fill in defaults and check required fields.
    ///
    /// `source` names the file the user should edit, for error messages.
    pub fn resolve(&self, source: &str) -> Result<ResolvedConfig> {
        let api_key = self
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingField {
                field: "api_key".to_string(),
                path: source.to_string(),
                env_var: API_KEY_ENV.to_string(),
            })?;

        let timeout_secs = self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let stream_timeout_secs = self
            .stream_timeout_secs
            .unwrap_or(DEFAULT_STREAM_TIMEOUT_SECS);
        for (field, value) in [
            ("timeout_secs", timeout_secs),
            ("stream_timeout_secs", stream_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }

        Ok(ResolvedConfig {
            host: self.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string()),
            api_key,
            user: self.user.clone().unwrap_or_else(|| DEFAULT_USER.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            stream_timeout: Duration::from_secs(stream_timeout_secs),
        })
    }
}
