//! Registration, login and logout.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use dairy_audit::{ActionType, AuditRequest, EntityType, ErrorDetails, SYSTEM_PRINCIPAL};
use dairy_core::{Role, User};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{audit, hash_password, snapshot, verify_password};
use crate::context::CallerContext;
use crate::error::ApiError;
use crate::middleware::{ACCESS_TOKEN_COOKIE, Session};
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::store::NewUser;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginBody {
    pub email: Option<String>,
    pub user_code: Option<String>,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user: User,
    pub access_token: String,
}

/// `POST /auth/register`: create an admin account.
pub async fn register(
    State(state): State<AppState>,
    caller: CallerContext,
    payload: Result<Json<RegisterBody>, JsonRejection>,
) -> Result<ApiResponse<User>, ApiError> {
    let Json(body) = payload?;
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }
    if state.users().find_login(Some(&body.email), None)?.is_some() {
        return Err(ApiError::bad_request("Admin already exists"));
    }

    let password_hash = hash_password(body.password).await?;
    let user = state.users().create(NewUser {
        role: Role::Admin,
        email: body.email,
        password_hash,
        first_name: None,
        last_name: None,
        fh_first_name: None,
        fh_last_name: None,
        dob: None,
        gender: None,
        phone: None,
    })?;
    tracing::info!(user_id = %user.id, user_code = %user.user_code, "Admin registered");

    audit(
        &state,
        &caller,
        AuditRequest::builder(ActionType::Create, EntityType::Admin)
            .entity_id(user.id)
            .performed_by(SYSTEM_PRINCIPAL)
            .old_data(Value::Null)
            .new_data(snapshot(&user))
            .reason("Admin registered"),
    )
    .await;

    Ok(ApiResponse::created(user, "Admin created successfully"))
}

/// `POST /auth/login`: exchange credentials for a session token.
pub async fn login(
    State(state): State<AppState>,
    caller: CallerContext,
    payload: Result<Json<LoginBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload?;
    let email = body.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
    let user_code = body.user_code.as_deref().map(str::trim).filter(|c| !c.is_empty());
    if email.is_none() && user_code.is_none() {
        return Err(ApiError::bad_request("Email or userCode is required"));
    }

    let user = state
        .users()
        .find_login(email, user_code)?
        .ok_or_else(|| ApiError::not_found("User does not exist"))?;

    if !verify_password(body.password, user.password_hash.clone()).await? {
        tracing::info!(user_id = %user.id, "Login refused");
        audit(
            &state,
            &caller,
            AuditRequest::builder(ActionType::Login, EntityType::User)
                .entity_id(user.id)
                .performed_by(user.id.to_string())
                .reason("Invalid credentials")
                .failed(ErrorDetails::new("INVALID_CREDENTIALS", "Invalid user credentials")),
        )
        .await;
        return Err(ApiError::Unauthorized("Invalid user credentials".to_string()));
    }

    let issued = state.tokens().mint(user.id, user.role)?;
    tracing::info!(user_id = %user.id, session_id = %issued.claims.session_id, "User logged in");

    audit(
        &state,
        &caller,
        AuditRequest::builder(ActionType::Login, EntityType::User)
            .entity_id(user.id)
            .performed_by(user.id.to_string())
            .reason("User logged in"),
    )
    .await;

    let cookie = session_cookie(&state, &issued.token);
    Ok((
        [(SET_COOKIE, cookie)],
        ApiResponse::ok(
            LoginData {
                user,
                access_token: issued.token,
            },
            "User logged in successfully",
        ),
    ))
}

/// `POST /auth/logout`: end the current session.
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    caller: CallerContext,
) -> Result<impl IntoResponse, ApiError> {
    state.tokens().revoke(&session.claims)?;
    tracing::info!(user_id = %session.user.id, session_id = %session.claims.session_id, "User logged out");

    audit(
        &state,
        &caller,
        AuditRequest::builder(ActionType::Logout, EntityType::User)
            .entity_id(session.user.id)
            .reason("User logged out"),
    )
    .await;

    let cookie = format!("{ACCESS_TOKEN_COOKIE}=; HttpOnly; Path=/; Max-Age=0; SameSite=Strict");
    Ok((
        [(SET_COOKIE, cookie)],
        ApiResponse::ok(json!({}), "User logged out successfully"),
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordBody {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// `POST /auth/change-password`
pub async fn change_password(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    caller: CallerContext,
    payload: Result<Json<ChangePasswordBody>, JsonRejection>,
) -> Result<ApiResponse<Value>, ApiError> {
    let Json(body) = payload?;
    if body.new_password.is_empty() {
        return Err(ApiError::bad_request("New password is required"));
    }
    if !verify_password(body.old_password, session.user.password_hash.clone()).await? {
        return Err(ApiError::Unauthorized("Invalid old password".to_string()));
    }

    let hash = hash_password(body.new_password).await?;
    if !state.users().set_password(session.user.id, hash)? {
        return Err(ApiError::not_found("User does not exist"));
    }

    audit(
        &state,
        &caller,
        AuditRequest::builder(ActionType::Update, EntityType::User)
            .entity_id(session.user.id)
            .reason("Password changed"),
    )
    .await;

    Ok(ApiResponse::ok(json!({}), "Password changed successfully"))
}

fn session_cookie(state: &AppState, token: &str) -> String {
    let mut cookie = format!(
        "{ACCESS_TOKEN_COOKIE}={token}; HttpOnly; Path=/; Max-Age={}; SameSite=Strict",
        state.tokens().ttl().num_seconds()
    );
    if state.config().auth.secure_cookies {
        cookie.push_str("; Secure");
    }
    cookie
}
