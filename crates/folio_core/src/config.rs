//! Client configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment variables. Command-line flags are applied last by the binary.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::types::DocumentPolicy;

/// Environment variable overriding the service base URL.
pub const ENV_BASE_URL: &str = "FOLIO_BASE_URL";
/// Environment variable overriding the request timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "FOLIO_TIMEOUT_SECS";

/// Connection settings for the content service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the content service, without a trailing slash
    pub base_url: String,
    /// Whole-request timeout in seconds
    pub request_timeout_secs: u64,
    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Upload rules checked before a document is sent
    pub documents: DocumentPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_secs: 60,
            connect_timeout_secs: 10,
            user_agent: concat!("folio/", env!("CARGO_PKG_VERSION")).to_string(),
            documents: DocumentPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::default().base_url(base_url)
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    pub fn connect_timeout(mut self, seconds: u64) -> Self {
        self.connect_timeout_secs = seconds;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn documents(mut self, policy: DocumentPolicy) -> Self {
        self.documents = policy;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Full URL for a service path such as `/chat`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Load a config file; missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!("Loading client config from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        let base_url = config.base_url.clone();
        Ok(config.base_url(base_url))
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::default().with_env()
    }

    /// Apply `FOLIO_*` overrides from the process environment.
    pub fn with_env(self) -> ConfigResult<Self> {
        self.with_env_from(|name| std::env::var(name).ok())
    }

    /// Apply `FOLIO_*` overrides using the given lookup.
    pub fn with_env_from<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self = self.base_url(url.trim());
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS).filter(|v| !v.trim().is_empty()) {
            let seconds = raw.trim().parse::<u64>().map_err(|e| ConfigError::InvalidEnv {
                name: ENV_TIMEOUT_SECS.to_string(),
                message: e.to_string(),
            })?;
            self.request_timeout_secs = seconds;
        }

        Ok(self)
    }

    /// Resolve the effective config: defaults, optional file, environment.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = base.with_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(
                "request timeout must be at least one second".to_string(),
            ));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(
                "connect timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert!(config.user_agent.starts_with("folio/"));
    }

    #[test]
    fn test_builder_and_endpoint() {
        let config = ClientConfig::new("https://books.example.com/api/")
            .timeout(5)
            .connect_timeout(2);

        assert_eq!(config.base_url, "https://books.example.com/api");
        assert_eq!(config.endpoint("/chat"), "https://books.example.com/api/chat");
        assert_eq!(config.endpoint("upload"), "https://books.example.com/api/upload");
        assert_eq!(config.connect_timeout_duration(), Duration::from_secs(2));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_BASE_URL, "http://10.0.0.2:9000/"),
            (ENV_TIMEOUT_SECS, "15"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::default()
            .with_env_from(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.base_url, "http://10.0.0.2:9000");
        assert_eq!(config.request_timeout_secs, 15);
    }

    #[test]
    fn test_env_rejects_bad_timeout() {
        let result = ClientConfig::default().with_env_from(|name| {
            (name == ENV_TIMEOUT_SECS).then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidEnv { .. })));
    }

    #[test]
    fn test_from_file_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.toml");
        std::fs::write(
            &path,
            "base_url = \"https://folio.example.org/\"\nrequest_timeout_secs = 90\n\n[documents]\nextensions = [\"pdf\", \"txt\"]\nmax_bytes = 1024\n",
        )
        .unwrap();

        let config = ClientConfig::from_file(&path).unwrap();
        assert_eq!(config.base_url, "https://folio.example.org");
        assert_eq!(config.request_timeout_secs, 90);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.documents.extensions, vec!["pdf", "txt"]);
        assert_eq!(config.documents.max_bytes, 1024);
    }

    #[test]
    fn test_from_file_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.toml");
        std::fs::write(&path, "base_url = [").unwrap();
        assert!(matches!(ClientConfig::from_file(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_url = ClientConfig::new("localhost:8000");
        assert!(matches!(bad_url.validate(), Err(ConfigError::InvalidBaseUrl(_))));

        let zero = ClientConfig::default().timeout(0);
        assert!(matches!(zero.validate(), Err(ConfigError::InvalidTimeout(_))));
    }
}
