//! Account management.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::{Extension, Json};
use chrono::NaiveDate;
use dairy_audit::{ActionType, AuditRequest, EntityType};
use dairy_core::{Role, User};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{audit, hash_password, snapshot};
use crate::context::CallerContext;
use crate::error::ApiError;
use crate::middleware::Session;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::store::{Member, NewUser, UserUpdate};

/// Body of `POST /users/create-account`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountBody {
    pub role: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub fh_first_name: Option<String>,
    pub fh_last_name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub phone: Option<String>,
}

impl CreateAccountBody {
    fn has_personal_details(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.first_name)
            && present(&self.last_name)
            && present(&self.fh_first_name)
            && present(&self.fh_last_name)
            && self.dob.is_some()
            && present(&self.gender)
            && present(&self.phone)
    }
}

/// `POST /users/create-account` (admin): create a farmer, sahayak or
/// incharge account and enrol it in the MPC.
pub async fn create_account(
    State(state): State<AppState>,
    caller: CallerContext,
    payload: Result<Json<CreateAccountBody>, JsonRejection>,
) -> Result<ApiResponse<User>, ApiError> {
    let Json(body) = payload?;
    let role = match body.role.as_deref().map(str::trim) {
        Some(role) if !role.is_empty() && !body.email.trim().is_empty() && !body.password.is_empty() => role,
        _ => return Err(ApiError::bad_request("Role, email and password are required")),
    };
    let role = role
        .parse::<Role>()
        .ok()
        .filter(|r| Role::CREATABLE.contains(r))
        .ok_or_else(|| {
            ApiError::bad_request(
                "Invalid role. You can only create farmer, sahayak, or incharge accounts",
            )
        })?;
    if !body.has_personal_details() {
        return Err(ApiError::bad_request(
            "First name, last name, father/husband details, date of birth, gender, and phone are required",
        ));
    }

    let password_hash = hash_password(body.password).await?;
    let user = state.users().create(NewUser {
        role,
        email: body.email,
        password_hash,
        first_name: body.first_name,
        last_name: body.last_name,
        fh_first_name: body.fh_first_name,
        fh_last_name: body.fh_last_name,
        dob: body.dob,
        gender: body.gender,
        phone: body.phone,
    })?;

    let (member, entity) = match role {
        Role::Farmer => (Member::Farmer, EntityType::Farmer),
        _ => (Member::Staff, EntityType::User),
    };
    state.mpc().add(member, user.id)?;
    tracing::info!(user_id = %user.id, user_code = %user.user_code, role = %role, "Account created");

    audit(
        &state,
        &caller,
        AuditRequest::builder(ActionType::Create, entity)
            .entity_id(user.id)
            .old_data(Value::Null)
            .new_data(snapshot(&user))
            .reason(format!("Created {role} account")),
    )
    .await;

    Ok(ApiResponse::created(user, "User created successfully"))
}

/// `PUT /users/update-account`: change the caller's own profile.
pub async fn update_account(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    caller: CallerContext,
    payload: Result<Json<UserUpdate>, JsonRejection>,
) -> Result<ApiResponse<User>, ApiError> {
    let Json(update) = payload?;
    if update.is_empty() {
        return Err(ApiError::bad_request("No fields provided to update"));
    }

    let updated = state
        .users()
        .update(session.user.id, update)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    audit(
        &state,
        &caller,
        AuditRequest::builder(ActionType::Update, EntityType::User)
            .entity_id(updated.after.id)
            .old_data(snapshot(&updated.before))
            .new_data(snapshot(&updated.after))
            .reason("Profile updated"),
    )
    .await;

    Ok(ApiResponse::ok(updated.after, "User updated successfully"))
}

/// `GET /users/current-user`
pub async fn current_user(Extension(session): Extension<Session>) -> ApiResponse<User> {
    ApiResponse::ok(session.user, "User found successfully")
}

/// `DELETE /users/delete-account`: remove the caller's own account and end
/// the session.
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    caller: CallerContext,
) -> Result<ApiResponse<Value>, ApiError> {
    let deleted = state
        .users()
        .delete(session.user.id)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    state.mpc().remove(deleted.id)?;
    state.tokens().revoke(&session.claims)?;
    tracing::info!(user_id = %deleted.id, "Account deleted");

    audit(
        &state,
        &caller,
        AuditRequest::builder(ActionType::Delete, EntityType::User)
            .entity_id(deleted.id)
            .old_data(snapshot(&deleted))
            .reason("Account deleted"),
    )
    .await;

    Ok(ApiResponse::ok(json!({}), "User deleted successfully"))
}
