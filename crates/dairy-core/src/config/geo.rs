//! IP geolocation configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the ipstack-compatible geolocation lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    /// Whether lookups are performed at all.
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of the lookup service; the IP is appended as a path segment.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Access key (prefer `api_key_env`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable containing the access key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Option<String>,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl GeoConfig {
    /// Resolve the access key, checking `api_key_env` first.
    pub fn resolve_api_key(&self) -> Option<String> {
        super::resolve_secret(self.api_key_env.as_deref(), self.api_key.as_deref())
    }
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_base_url(),
            api_key: None,
            api_key_env: default_api_key_env(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_base_url() -> String {
    "http://api.ipstack.com".to_string()
}

fn default_api_key_env() -> Option<String> {
    Some("GEO_IP_STACK_API_KEY".to_string())
}

fn default_timeout_ms() -> u64 {
    2_000
}
