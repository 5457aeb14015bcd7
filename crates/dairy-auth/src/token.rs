//! Session token minting and verification.
//!
//! A session token is a single-block Biscuit signed by the server key. The
//! authority block carries the facts
//!
//! ```text
//! user("<uuid>"); role("<role>"); session_id("<uuid>"); expiry(<unix secs>);
//! check if time($time), $time < <unix secs>;
//! ```
//!
//! so an expired token fails authorization on its own check.

use crate::error::AuthError;
use crate::keys::KeyPair;
use biscuit_auth::builder::AuthorizerBuilder;
use biscuit_auth::macros::fact;
use biscuit_auth::{Authorizer, Biscuit};
use chrono::{DateTime, Duration, Utc};
use dairy_core::Role;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// Claims carried by a verified session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub user_id: Uuid,
    pub role: Role,
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// A freshly minted token and its claims.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: SessionClaims,
}

/// Mints and verifies session tokens, and tracks sessions ended by logout.
pub struct TokenService {
    keypair: KeyPair,
    ttl: Duration,
    /// Revoked session ids with their expiry; entries past expiry are pruned.
    revoked: RwLock<HashMap<Uuid, DateTime<Utc>>>,
}

impl TokenService {
    pub fn new(keypair: KeyPair, ttl_secs: u64) -> Self {
        Self {
            keypair,
            ttl: i64::try_from(ttl_secs)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
            revoked: RwLock::new(HashMap::new()),
        }
    }

    /// Token lifetime, used for cookie `Max-Age`.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a session token for `user_id`.
    pub fn mint(&self, user_id: Uuid, role: Role) -> Result<IssuedToken, AuthError> {
        let expires_at = Utc::now().checked_add_signed(self.ttl).ok_or_else(|| {
            AuthError::TokenCreationFailed(format!(
                "session lifetime of {}s is out of range",
                self.ttl.num_seconds()
            ))
        })?;
        let claims = SessionClaims {
            user_id,
            role,
            session_id: Uuid::new_v4(),
            expires_at,
        };
        let expiry = claims.expires_at.timestamp();

        let biscuit = Biscuit::builder()
            .fact(fact!("user({user})", user = user_id.to_string()))
            .map_err(|e| AuthError::TokenCreationFailed(e.to_string()))?
            .fact(fact!("role({role})", role = role.as_str().to_string()))
            .map_err(|e| AuthError::TokenCreationFailed(e.to_string()))?
            .fact(fact!(
                "session_id({session})",
                session = claims.session_id.to_string()
            ))
            .map_err(|e| AuthError::TokenCreationFailed(e.to_string()))?
            .fact(fact!("expiry({expiry})", expiry = expiry))
            .map_err(|e| AuthError::TokenCreationFailed(e.to_string()))?
            .code(format!("check if time($time), $time < {expiry};"))
            .map_err(|e| AuthError::TokenCreationFailed(e.to_string()))?
            .build(self.keypair.inner())
            .map_err(|e| AuthError::TokenCreationFailed(e.to_string()))?;

        let token = biscuit
            .to_base64()
            .map_err(|e| AuthError::TokenCreationFailed(e.to_string()))?;

        tracing::debug!(user_id = %user_id, role = %role, session_id = %claims.session_id, "Minted session token");

        Ok(IssuedToken { token, claims })
    }

    /// Verify signature, expiry and revocation, then extract the claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let biscuit = Biscuit::from_base64(token, self.keypair.public_key())
            .map_err(|e| AuthError::TokenParseFailed(e.to_string()))?;

        let now = Utc::now().timestamp();
        let mut authorizer = AuthorizerBuilder::new()
            .code(format!(
                r#"
                time({now});
                allow if user($u);
                "#
            ))
            .map_err(|e| AuthError::VerificationFailed(e.to_string()))?
            .build(&biscuit)
            .map_err(|e| AuthError::VerificationFailed(e.to_string()))?;

        authorizer
            .authorize()
            .map_err(|e| AuthError::VerificationFailed(e.to_string()))?;

        let user_id = parse_uuid("user", &query_string(&mut authorizer, "user")?)?;
        let session_id = parse_uuid("session_id", &query_string(&mut authorizer, "session_id")?)?;
        let role = query_string(&mut authorizer, "role")?
            .parse::<Role>()
            .map_err(AuthError::VerificationFailed)?;
        let expiry = query_integer(&mut authorizer, "expiry")?;
        let expires_at = DateTime::from_timestamp(expiry, 0).ok_or(AuthError::MissingClaim {
            claim: "expiry".to_string(),
        })?;

        if self.is_revoked(session_id)? {
            return Err(AuthError::Revoked);
        }

        Ok(SessionClaims {
            user_id,
            role,
            session_id,
            expires_at,
        })
    }

    /// End a session. Tokens for it fail verification from now on.
    ///
    /// Sessions that have already expired are dropped from the list, since
    /// their tokens fail the expiry check anyway.
    pub fn revoke(&self, claims: &SessionClaims) -> Result<(), AuthError> {
        let now = Utc::now();
        let mut revoked = self
            .revoked
            .write()
            .map_err(|e| AuthError::VerificationFailed(format!("revocation list poisoned: {e}")))?;
        revoked.retain(|_, expires_at| *expires_at > now);
        if claims.expires_at > now {
            revoked.insert(claims.session_id, claims.expires_at);
        }
        Ok(())
    }

    /// Number of sessions currently tracked as revoked.
    pub fn revoked_count(&self) -> usize {
        self.revoked.read().map(|r| r.len()).unwrap_or(0)
    }

    fn is_revoked(&self, session_id: Uuid) -> Result<bool, AuthError> {
        let revoked = self
            .revoked
            .read()
            .map_err(|e| AuthError::VerificationFailed(format!("revocation list poisoned: {e}")))?;
        Ok(revoked.contains_key(&session_id))
    }
}

fn parse_uuid(claim: &str, value: &str) -> Result<Uuid, AuthError> {
    Uuid::parse_str(value).map_err(|_| AuthError::MissingClaim {
        claim: claim.to_string(),
    })
}

fn rule(name: &str) -> Result<biscuit_auth::builder::Rule, AuthError> {
    format!("data($x) <- {}($x)", name)
        .parse()
        .map_err(|e: biscuit_auth::error::Token| AuthError::VerificationFailed(e.to_string()))
}

fn query_string(authorizer: &mut Authorizer, name: &str) -> Result<String, AuthError> {
    let results: Vec<(String,)> = authorizer
        .query(rule(name)?)
        .map_err(|e| AuthError::VerificationFailed(e.to_string()))?;
    results
        .into_iter()
        .next()
        .map(|(s,)| s)
        .ok_or_else(|| AuthError::MissingClaim {
            claim: name.to_string(),
        })
}

fn query_integer(authorizer: &mut Authorizer, name: &str) -> Result<i64, AuthError> {
    let results: Vec<(i64,)> = authorizer
        .query(rule(name)?)
        .map_err(|e| AuthError::VerificationFailed(e.to_string()))?;
    results
        .into_iter()
        .next()
        .map(|(v,)| v)
        .ok_or_else(|| AuthError::MissingClaim {
            claim: name.to_string(),
        })
}
