//! Request handlers for the `/api/v1` surface.

pub mod audits;
pub mod auth;
pub mod bmc;
pub mod health;
pub mod mpc;
pub mod mpp;
pub mod users;

use dairy_audit::{AuditRecord, AuditRequestBuilder};
use serde::Serialize;
use serde_json::Value;

use crate::context::CallerContext;
use crate::error::ApiError;
use crate::state::AppState;

/// Write an audit record for the current request.
///
/// The caller's principal fills in `performedBy` unless the builder set one,
/// and location metadata is merged under any entries already present.
/// Failures are logged and never reach the client.
pub(crate) async fn audit(
    state: &AppState,
    caller: &CallerContext,
    builder: AuditRequestBuilder,
) -> Option<AuditRecord> {
    let mut request = builder.build();
    if request.performed_by.is_none() {
        request.performed_by = caller.principal_id.map(|id| id.to_string());
    }
    for (key, value) in caller.audit_metadata(state.geo()).await {
        request.metadata.entry(key).or_insert(value);
    }

    let action = request.action.clone();
    let entity = request.entity.clone();
    match state.audit().record(request).await {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::error!(action = %action, entity = %entity, error = %e, "Failed to write audit record");
            None
        }
    }
}

/// JSON snapshot of an entity for diffing.
pub(crate) fn snapshot<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Hash a password on the blocking pool; Argon2 is CPU bound.
pub(crate) async fn hash_password(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || dairy_auth::hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(format!("password hashing task failed: {e}")))?
        .map_err(ApiError::from)
}

/// Check a password against a stored hash on the blocking pool.
pub(crate) async fn verify_password(password: String, stored_hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || dairy_auth::verify_password(&password, &stored_hash))
        .await
        .map_err(|e| ApiError::Internal(format!("password check task failed: {e}")))?
        .map_err(ApiError::from)
}
