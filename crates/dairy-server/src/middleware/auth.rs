use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::middleware::Next;
use axum::response::Response;
use dairy_auth::SessionClaims;
use dairy_core::{Role, User};

use crate::error::ApiError;
use crate::state::AppState;

/// Name of the cookie carrying the session token.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

const UNAUTHORIZED: &str = "Unauthorized request";

/// An authenticated caller, inserted into request extensions by
/// [`require_session`].
#[derive(Clone, Debug)]
pub struct Session {
    pub user: User,
    pub claims: SessionClaims,
}

/// Axum middleware that rejects requests without a valid session:
/// - token from `Authorization: Bearer` or the `accessToken` cookie
/// - biscuit signature, expiry and revocation checks
/// - the account must still exist
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(req.headers())
        .ok_or_else(|| ApiError::Unauthorized(UNAUTHORIZED.to_string()))?;

    let claims = state.tokens().verify(&token)?;

    let user = state
        .users()
        .get(claims.user_id)?
        .ok_or_else(|| ApiError::Unauthorized("Invalid access token".to_string()))?;

    tracing::debug!(
        user_id = %user.id,
        role = %user.role,
        session_id = %claims.session_id,
        "Session verified"
    );

    req.extensions_mut().insert(Session { user, claims });
    Ok(next.run(req).await)
}

/// Layered after [`require_session`]; only admins pass.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let session = req
        .extensions()
        .get::<Session>()
        .ok_or_else(|| ApiError::Unauthorized(UNAUTHORIZED.to_string()))?;

    if session.user.role != Role::Admin {
        tracing::debug!(user_id = %session.user.id, role = %session.user.role, "Admin route refused");
        return Err(ApiError::Forbidden(
            "Only admin can perform this action".to_string(),
        ));
    }
    Ok(next.run(req).await)
}

/// Session token from the bearer header, falling back to the cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(rest) = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        let rest = rest.trim();
        if !rest.is_empty() {
            return Some(rest.to_string());
        }
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == ACCESS_TOKEN_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_token_from_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; accessToken=tok; other=1"));
        assert_eq!(extract_token(&headers).as_deref(), Some("tok"));
    }

    #[test]
    fn test_extract_token_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        headers.insert(COOKIE, HeaderValue::from_static("accessToken="));
        assert_eq!(extract_token(&headers), None);
    }
}
