//! Ed25519 signing keys for session tokens.

use crate::error::AuthError;
use biscuit_auth::{Algorithm, KeyPair as BiscuitKeyPair, PrivateKey, PublicKey};
use dairy_core::AuthConfig;
use rand::RngCore;
use std::path::Path;

/// An Ed25519 keypair for signing and verifying session tokens.
pub struct KeyPair {
    inner: BiscuitKeyPair,
}

impl KeyPair {
    /// Generate a new random keypair.
    pub fn generate() -> Result<Self, AuthError> {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);

        let private_key = PrivateKey::from_bytes(&bytes, Algorithm::Ed25519)
            .map_err(|e| AuthError::KeyGenerationFailed(e.to_string()))?;
        Ok(Self {
            inner: BiscuitKeyPair::from(&private_key),
        })
    }

    /// Load a keypair from a hex-encoded private key string.
    pub fn from_private_key_hex(hex: &str) -> Result<Self, AuthError> {
        let private_key = PrivateKey::from_bytes_hex(hex.trim(), Algorithm::Ed25519)
            .map_err(|e| AuthError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self {
            inner: BiscuitKeyPair::from(&private_key),
        })
    }

    /// Load the configured signing key, or generate an ephemeral one.
    ///
    /// Tokens signed with an ephemeral key stop verifying after a restart.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        match config.resolve_private_key() {
            Some(hex) => Self::from_private_key_hex(&hex),
            None => {
                tracing::warn!(
                    env = config.private_key_env.as_deref().unwrap_or("-"),
                    "No session signing key configured, using an ephemeral key"
                );
                Self::generate()
            }
        }
    }

    /// Load a keypair from a private key file.
    pub fn load_from_file(path: &Path) -> Result<Self, AuthError> {
        let hex = std::fs::read_to_string(path)?;
        Self::from_private_key_hex(&hex)
    }

    /// Write the private key as hex to `path`.
    pub fn save_to_file(&self, path: &Path) -> Result<(), AuthError> {
        std::fs::write(path, self.private_key_hex())?;
        Ok(())
    }

    pub(crate) fn inner(&self) -> &BiscuitKeyPair {
        &self.inner
    }

    pub fn public_key(&self) -> PublicKey {
        self.inner.public()
    }

    pub fn private_key_hex(&self) -> String {
        self.inner.private().to_bytes_hex()
    }

    pub fn public_key_hex(&self) -> String {
        self.inner.public().to_bytes_hex()
    }
}
