//! HTTP server configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the HTTP API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, e.g. "0.0.0.0:8000".
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Trust the first `x-forwarded-for` entry as the client address.
    #[serde(default = "default_trust_forwarded")]
    pub trust_forwarded_for: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            trust_forwarded_for: default_trust_forwarded(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_trust_forwarded() -> bool {
    true
}
