//! Configuration types for the dairy admin backend.
//!
//! Configuration is loaded from a single YAML file (`dairy.yaml` by default).
//! Every section is optional and falls back to its defaults, so an empty file
//! (or no file at all) yields a runnable development setup.
//!
//! Secrets are never required inline: sections that need one accept an
//! `*_env` field naming an environment variable, which takes precedence over
//! the inline value.

pub mod audit;
pub mod auth;
pub mod geo;
pub mod server;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use audit::{AuditConfig, StorageBackend};
pub use auth::AuthConfig;
pub use geo::GeoConfig;
pub use server::ServerConfig;

/// Complete configuration loaded from `dairy.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DairyConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Audit logging configuration.
    #[serde(default)]
    pub audit: AuditConfig,

    /// Session token configuration.
    #[serde(default)]
    pub auth: AuthConfig,

    /// IP geolocation lookups.
    #[serde(default)]
    pub geo: GeoConfig,

    /// Log output configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Log output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DairyConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // serde_yaml rejects an empty document, treat it as "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.audit.enabled
            && self.audit.storage.backend == StorageBackend::File
            && self.audit.storage.file_path.trim().is_empty()
        {
            return Err(ConfigError::Config(
                "audit.storage.file_path must be set for the file backend".to_string(),
            ));
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(ConfigError::Config(
                "auth.token_ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.auth.token_ttl_secs > auth::MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::Config(format!(
                "auth.token_ttl_secs must be at most {}",
                auth::MAX_TOKEN_TTL_SECS
            )));
        }
        if self.geo.enabled && self.geo.timeout_ms == 0 {
            return Err(ConfigError::Config(
                "geo.timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolve a secret from an environment variable (preferred) or an inline value.
pub(crate) fn resolve_secret(env_var: Option<&str>, inline: Option<&str>) -> Option<String> {
    if let Some(var) = env_var
        && let Ok(value) = std::env::var(var)
        && !value.trim().is_empty()
    {
        return Some(value);
    }
    inline
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let config = DairyConfig::from_yaml("").unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8000");
        assert!(config.audit.enabled);
        assert_eq!(config.audit.storage.backend, StorageBackend::Memory);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_sections() {
        let yaml = r#"
server:
  bind: "127.0.0.1:9000"
audit:
  log_healthchecks: false
  storage:
    backend: file
    file_path: /var/lib/dairy/audit.jsonl
auth:
  token_ttl_secs: 600
geo:
  enabled: true
  api_key_env: IPSTACK_KEY
"#;
        let config = DairyConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert!(!config.audit.log_healthchecks);
        assert_eq!(config.audit.storage.backend, StorageBackend::File);
        assert_eq!(config.audit.storage.file_path, "/var/lib/dairy/audit.jsonl");
        assert_eq!(config.auth.token_ttl_secs, 600);
        assert!(config.geo.enabled);
        assert_eq!(config.geo.api_key_env.as_deref(), Some("IPSTACK_KEY"));
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let err = DairyConfig::from_yaml("auth:\n  token_ttl_secs: 0\n").unwrap_err();
        assert!(err.to_string().contains("token_ttl_secs"));
    }

    #[test]
    fn test_validate_rejects_oversized_ttl() {
        let err = DairyConfig::from_yaml("auth:\n  token_ttl_secs: 10000000000000\n").unwrap_err();
        assert!(err.to_string().contains("at most"));

        let yaml = format!("auth:\n  token_ttl_secs: {}\n", auth::MAX_TOKEN_TTL_SECS);
        assert!(DairyConfig::from_yaml(&yaml).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_file_path() {
        let yaml = "audit:\n  storage:\n    backend: file\n    file_path: \"\"\n";
        assert!(DairyConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = DairyConfig::load_or_default(dir.path().join("missing.yaml")).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8000");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "logging:\n  level: debug").unwrap();
        let config = DairyConfig::from_file(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_resolve_secret_prefers_inline_when_env_missing() {
        let secret = resolve_secret(Some("DAIRY_TEST_SURELY_UNSET_VAR"), Some("inline"));
        assert_eq!(secret.as_deref(), Some("inline"));
        assert_eq!(resolve_secret(None, Some("  ")), None);
    }
}
