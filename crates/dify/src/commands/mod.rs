//! CLI command handlers.

use anyhow::{Context as _, Result};
use dify_client::DifyClient;
use dify_config::{ClientConfig, ResolvedConfig};
use tokio_util::sync::CancellationToken;

pub mod chat;
pub mod config;
pub mod conversations;
pub mod workflow;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Merged file, env and flag settings, before defaults are applied.
    pub config: ClientConfig,
    /// Where a user should put missing settings.
    pub config_path: String,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Fired on Ctrl-C.
    pub cancel: CancellationToken,
}

impl Context {
    /// Apply defaults and check required settings.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        Ok(self.config.resolve(&self.config_path)?)
    }

    /// Build an API client from the resolved settings.
    pub fn client(&self) -> Result<(DifyClient, ResolvedConfig)> {
        let resolved = self.resolve()?;
        let client = DifyClient::builder()
            .base_url(&resolved.host)
            .api_key(&resolved.api_key)
            .timeout(resolved.timeout)
            .stream_timeout(resolved.stream_timeout)
            .build()
            .with_context(|| format!("invalid host '{}'", resolved.host))?;
        Ok((client, resolved))
    }
}

/// Parse a `key=value` input argument.
///
/// Values that parse as JSON (numbers, booleans, objects) are sent as such;
/// anything else is sent as a string.
pub fn parse_input(arg: &str) -> std::result::Result<(String, serde_json::Value), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{arg}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{arg}'"));
    }
    let value = serde_json::from_str(value)
        .ok()
        .filter(|v: &serde_json::Value| !v.is_string())
        .unwrap_or_else(|| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_input_string() {
        assert_eq!(
            parse_input("city=Lisbon").unwrap(),
            ("city".to_string(), json!("Lisbon"))
        );
    }

    #[test]
    fn test_parse_input_json_values() {
        assert_eq!(parse_input("n=3").unwrap().1, json!(3));
        assert_eq!(parse_input("flag=true").unwrap().1, json!(true));
        assert_eq!(parse_input("q=\"3\"").unwrap().1, json!("\"3\""));
    }

    #[test]
    fn test_parse_input_keeps_later_equals() {
        assert_eq!(parse_input("expr=a=b").unwrap().1, json!("a=b"));
    }

    #[test]
    fn test_parse_input_rejects_malformed() {
        assert!(parse_input("novalue").is_err());
        assert!(parse_input("=x").is_err());
    }

    #[test]
    fn test_client_requires_api_key() {
        let ctx = Context {
            config: ClientConfig::default(),
            config_path: "client.toml".to_string(),
            json_output: false,
            verbose: false,
            cancel: CancellationToken::new(),
        };
        let Err(err) = ctx.client() else {
            panic!("expected ctx.client() to fail without api_key");
        };
        assert!(err.to_string().contains("api_key"));
    }
}
