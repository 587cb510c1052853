//! Client configuration
//!
//! Read from a TOML file; `DOCTYPE_HOST`, `DOCTYPE_TOKEN` and
//! `DOCTYPE_NAMESPACE` override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ClientError, Result};

/// Environment variable overriding the backend host
pub const HOST_ENV: &str = "DOCTYPE_HOST";
/// Environment variable overriding the auth token
pub const TOKEN_ENV: &str = "DOCTYPE_TOKEN";
/// Environment variable overriding the method namespace
pub const NAMESPACE_ENV: &str = "DOCTYPE_NAMESPACE";

/// Connection and paging settings of the doctype client
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend origin, e.g. `https://crm.example.com`
    pub host: String,
    /// Dotted module path of the whitelisted list/single/delete methods
    pub namespace: String,
    /// Base64-encoded API token
    pub token: Option<String>,
    /// Rows per list page
    pub page_length: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Lifetime of cached descriptor lists in seconds
    pub cache_ttl_secs: u64,
    /// Maximum number of cached descriptor lists
    pub cache_capacity: u64,
    /// Where user preferences are persisted
    pub preferences_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            namespace: default_namespace(),
            token: None,
            page_length: doctype_meta::DEFAULT_PAGE_LENGTH,
            timeout_secs: 30,
            cache_ttl_secs: 300,
            cache_capacity: 256,
            preferences_path: None,
        }
    }
}

fn default_host() -> String {
    "http://localhost:8000".to_string()
}

fn default_namespace() -> String {
    "erptech_lead.api.doctype".to_string()
}

impl ClientConfig {
    /// Config for a host with defaults elsewhere
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Set the base64 token
    #[inline]
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the method namespace
    #[inline]
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// `ClientError::Config` when the text is not a valid config.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ClientError::Config(format!("parse: {e}")))
    }

    /// Load a TOML file and apply environment overrides
    ///
    /// # Errors
    /// `ClientError::Config` when the file cannot be read or parsed, or the
    /// result is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("read '{}': {e}", path.display())))?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        tracing::debug!("Loaded client config from {}", path.display());
        Ok(config)
    }

    /// Apply overrides from an environment lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(HOST_ENV).filter(|v| !v.is_empty()) {
            self.host = host;
        }
        if let Some(token) = lookup(TOKEN_ENV).filter(|v| !v.is_empty()) {
            self.token = Some(token);
        }
        if let Some(namespace) = lookup(NAMESPACE_ENV).filter(|v| !v.is_empty()) {
            self.namespace = namespace;
        }
    }

    /// Check that the values can drive a client
    ///
    /// # Errors
    /// `ClientError::Config` naming the offending setting.
    pub fn validate(&self) -> Result<()> {
        let host = url::Url::parse(&self.host).map_err(|e| ClientError::Config(format!("host '{}': {e}", self.host)))?;
        if !matches!(host.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!("host '{}' must be http or https", self.host)));
        }
        if self.namespace.trim().is_empty() {
            return Err(ClientError::Config("namespace must not be empty".into()));
        }
        if self.page_length == 0 {
            return Err(ClientError::Config("page_length must be at least 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ClientError::Config("timeout_secs must be at least 1".into()));
        }
        Ok(())
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Descriptor cache lifetime
    #[inline]
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
