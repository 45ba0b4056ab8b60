//! Backend connection configuration.
//!
//! Loaded once at startup from environment variables:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `TYPESENSE_HOST` | `localhost` |
//! | `TYPESENSE_PORT` | `8108` |
//! | `TYPESENSE_PROTOCOL` | `http` |
//! | `TYPESENSE_API_KEY` | `xyz` |
//! | `TACITBASE_BASE_URL` | `https://staging.local.tacitbase.com/v1` |
//! | `TACITBASE_AUTH_TOKEN_VAR` | `TACITBASE_AUTH_TOKEN` |
//! | `TACIT_REQUEST_TIMEOUT_SECS` | `30` |
//! | `TACIT_FALLBACK_ENABLED` | `true` |
//!
//! The Secondary credential is not part of the loaded configuration; only the
//! name of the variable holding it is. The remote backend reads it per call.

use std::env;

use thiserror::Error;
use tracing::debug;

use tacit_core::defaults;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid protocol: {0} (expected http or https)")]
    InvalidProtocol(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for tacit_core::Error {
    fn from(e: ConfigError) -> Self {
        tacit_core::Error::Config(e.to_string())
    }
}

/// Primary (Typesense) connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypesenseConfig {
    pub host: String,
    pub port: u16,
    pub protocol: String,
    pub api_key: String,
}

impl Default for TypesenseConfig {
    fn default() -> Self {
        Self {
            host: defaults::TYPESENSE_HOST.to_string(),
            port: defaults::TYPESENSE_PORT,
            protocol: defaults::TYPESENSE_PROTOCOL.to_string(),
            api_key: defaults::TYPESENSE_API_KEY.to_string(),
        }
    }
}

impl TypesenseConfig {
    /// Base URL, e.g. `http://localhost:8108`.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Validation(
                "TYPESENSE_HOST cannot be empty".to_string(),
            ));
        }

        match self.protocol.as_str() {
            "http" | "https" => {}
            other => return Err(ConfigError::InvalidProtocol(other.to_string())),
        }

        if self.port == 0 {
            return Err(ConfigError::Validation(
                "TYPESENSE_PORT cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Secondary (remote API) connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub base_url: String,
    /// Name of the environment variable holding the `Authorization` value.
    pub auth_token_var: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::TACITBASE_BASE_URL.to_string(),
            auth_token_var: defaults::TACITBASE_AUTH_TOKEN_VAR.to_string(),
        }
    }
}

impl RemoteConfig {
    /// Full search endpoint URL.
    pub fn search_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            defaults::TACITBASE_SEARCH_PATH
        )
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "TACITBASE_BASE_URL must start with http:// or https://, got: {}",
                self.base_url
            )));
        }

        if self.auth_token_var.trim().is_empty() {
            return Err(ConfigError::Validation(
                "TACITBASE_AUTH_TOKEN_VAR cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Complete backend configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub typesense: TypesenseConfig,
    pub remote: RemoteConfig,
    pub timeout_secs: u64,
    /// Whether keyword and semantic candidate search may fall back to the Secondary.
    pub fallback_enabled: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            typesense: TypesenseConfig::default(),
            remote: RemoteConfig::default(),
            timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            fallback_enabled: true,
        }
    }
}

impl BackendConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// Blank values count as unset. Unparseable numbers and flags fall back
    /// to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = Self::default();
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let string = |key: &str, default: String| lookup(key).unwrap_or(default);

        let config = Self {
            typesense: TypesenseConfig {
                host: string("TYPESENSE_HOST", base.typesense.host),
                port: lookup("TYPESENSE_PORT")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(base.typesense.port),
                protocol: string("TYPESENSE_PROTOCOL", base.typesense.protocol)
                    .trim()
                    .to_lowercase(),
                api_key: string("TYPESENSE_API_KEY", base.typesense.api_key),
            },
            remote: RemoteConfig {
                base_url: string("TACITBASE_BASE_URL", base.remote.base_url),
                auth_token_var: string("TACITBASE_AUTH_TOKEN_VAR", base.remote.auth_token_var),
            },
            timeout_secs: lookup("TACIT_REQUEST_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(base.timeout_secs),
            fallback_enabled: lookup("TACIT_FALLBACK_ENABLED")
                .and_then(|s| parse_flag(&s))
                .unwrap_or(base.fallback_enabled),
        };

        debug!(
            typesense = %config.typesense.base_url(),
            remote = %config.remote.base_url,
            timeout_secs = config.timeout_secs,
            fallback_enabled = config.fallback_enabled,
            "Loaded backend configuration"
        );
        config
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.typesense.validate()?;
        self.remote.validate()?;
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
