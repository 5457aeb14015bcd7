//! Error types for the auth crate.

use thiserror::Error;

/// Errors that can occur while issuing or checking credentials.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Failed to generate keypair.
    #[error("failed to generate keypair: {0}")]
    KeyGenerationFailed(String),

    /// Failed to parse private key.
    #[error("failed to parse private key: {0}")]
    InvalidPrivateKey(String),

    /// Failed to create token.
    #[error("failed to create token: {0}")]
    TokenCreationFailed(String),

    /// Failed to parse token.
    #[error("failed to parse token: {0}")]
    TokenParseFailed(String),

    /// Token verification failed, including expiry checks.
    #[error("token verification failed: {0}")]
    VerificationFailed(String),

    /// Token is missing required claim.
    #[error("token missing required claim: {claim}")]
    MissingClaim { claim: String },

    /// Session was ended by logout.
    #[error("session has been revoked")]
    Revoked,

    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    /// IO error (reading/writing keys).
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AuthError {
    /// True when the presented credential itself is unacceptable.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::TokenParseFailed(_)
                | Self::VerificationFailed(_)
                | Self::MissingClaim { .. }
                | Self::Revoked
        )
    }
}
