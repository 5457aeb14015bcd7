//! # dairy-auth
//!
//! Credentials for the dairy admin backend:
//! - Ed25519 keypairs for signing session tokens
//! - Biscuit session tokens carrying user, role, session id and expiry
//! - Argon2 password hashing

pub mod error;
pub mod keys;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use keys::KeyPair;
pub use password::{hash_password, verify_password};
pub use token::{IssuedToken, SessionClaims, TokenService};
