//! Session token configuration.

use serde::{Deserialize, Serialize};

/// Longest accepted session lifetime: ten years.
pub const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 86_400;

/// Configuration for signing and accepting session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Hex-encoded Ed25519 private key used to sign session tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,

    /// Environment variable containing the private key (takes precedence).
    #[serde(default = "default_private_key_env")]
    pub private_key_env: Option<String>,

    /// Session token lifetime in seconds.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// Mark the session cookie `Secure`.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

impl AuthConfig {
    /// Resolve the signing key, checking `private_key_env` first.
    pub fn resolve_private_key(&self) -> Option<String> {
        super::resolve_secret(self.private_key_env.as_deref(), self.private_key.as_deref())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            private_key: None,
            private_key_env: default_private_key_env(),
            token_ttl_secs: default_token_ttl_secs(),
            secure_cookies: default_secure_cookies(),
        }
    }
}

fn default_private_key_env() -> Option<String> {
    Some("DAIRY_AUTH_PRIVATE_KEY".to_string())
}

fn default_token_ttl_secs() -> u64 {
    // one day
    86_400
}

fn default_secure_cookies() -> bool {
    true
}
