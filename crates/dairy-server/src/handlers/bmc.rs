//! BMC CRUD.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use dairy_audit::{ActionType, AuditRequest, EntityType};
use dairy_core::Bmc;
use serde_json::{Value, json};

use super::{audit, snapshot};
use crate::context::CallerContext;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::store::{BmcUpdate, Member, NewBmc};

const NOT_FOUND: &str = "BMC not found";

/// `POST /bmcs`
pub async fn create_bmc(
    State(state): State<AppState>,
    caller: CallerContext,
    payload: Result<Json<NewBmc>, JsonRejection>,
) -> Result<ApiResponse<Bmc>, ApiError> {
    let Json(new) = payload?;
    if new.name.trim().is_empty() {
        return Err(ApiError::bad_request("name is required"));
    }

    let bmc = state.bmcs().create(new)?;
    state.mpc().add(Member::Bmc, bmc.id)?;
    tracing::info!(bmc_code = %bmc.bmc_code, bmc_id = %bmc.id, "BMC created");

    audit(
        &state,
        &caller,
        AuditRequest::builder(ActionType::Create, EntityType::Bmc)
            .entity_id(bmc.id)
            .old_data(Value::Null)
            .new_data(snapshot(&bmc))
            .reason("BMC created"),
    )
    .await;

    Ok(ApiResponse::created(bmc, "BMC created successfully"))
}

/// `GET /bmcs`
pub async fn list_bmcs(
    State(state): State<AppState>,
    caller: CallerContext,
) -> Result<ApiResponse<Vec<Bmc>>, ApiError> {
    let bmcs = state.bmcs().list()?;

    audit(
        &state,
        &caller,
        AuditRequest::builder(ActionType::Retrieve, EntityType::Bmc).reason("Retrieved all BMCs"),
    )
    .await;

    Ok(ApiResponse::ok(bmcs, "BMCs retrieved successfully"))
}

/// `GET /bmcs/{bmc_code}`
pub async fn get_bmc(
    State(state): State<AppState>,
    Path(bmc_code): Path<String>,
    caller: CallerContext,
) -> Result<ApiResponse<Bmc>, ApiError> {
    let bmc = state
        .bmcs()
        .get(&bmc_code)?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    audit(
        &state,
        &caller,
        AuditRequest::builder(ActionType::Retrieve, EntityType::Bmc)
            .entity_id(bmc.id)
            .reason("Retrieved a single BMC"),
    )
    .await;

    Ok(ApiResponse::ok(bmc, "BMC retrieved successfully"))
}

/// `PUT /bmcs/{bmc_code}`
pub async fn update_bmc(
    State(state): State<AppState>,
    Path(bmc_code): Path<String>,
    caller: CallerContext,
    payload: Result<Json<BmcUpdate>, JsonRejection>,
) -> Result<ApiResponse<Bmc>, ApiError> {
    let Json(update) = payload?;
    if update.is_empty() {
        return Err(ApiError::bad_request("No fields provided to update"));
    }

    let updated = state
        .bmcs()
        .update(&bmc_code, update)?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    audit(
        &state,
        &caller,
        AuditRequest::builder(ActionType::Update, EntityType::Bmc)
            .entity_id(updated.after.id)
            .old_data(snapshot(&updated.before))
            .new_data(snapshot(&updated.after))
            .reason("BMC updated"),
    )
    .await;

    Ok(ApiResponse::ok(updated.after, "BMC updated successfully"))
}

/// `DELETE /bmcs/{bmc_code}`
pub async fn delete_bmc(
    State(state): State<AppState>,
    Path(bmc_code): Path<String>,
    caller: CallerContext,
) -> Result<ApiResponse<Value>, ApiError> {
    let deleted = state
        .bmcs()
        .delete(&bmc_code)?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    state.mpc().remove(deleted.id)?;
    tracing::info!(bmc_code = %deleted.bmc_code, "BMC deleted");

    audit(
        &state,
        &caller,
        AuditRequest::builder(ActionType::Delete, EntityType::Bmc)
            .entity_id(deleted.id)
            .old_data(snapshot(&deleted))
            .reason("BMC deleted"),
    )
    .await;

    Ok(ApiResponse::ok(json!({}), "BMC deleted successfully"))
}
