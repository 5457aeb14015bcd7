//! MPP CRUD. Every MPP hangs off an existing BMC.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use dairy_audit::{ActionType, AuditRequest, EntityType};
use dairy_core::Mpp;
use serde_json::{Value, json};

use super::{audit, snapshot};
use crate::context::CallerContext;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::store::{Member, MppUpdate, NewMpp};

const NOT_FOUND: &str = "MPP not found";

/// `POST /mpps`
pub async fn create_mpp(
    State(state): State<AppState>,
    caller: CallerContext,
    payload: Result<Json<NewMpp>, JsonRejection>,
) -> Result<ApiResponse<Mpp>, ApiError> {
    let Json(new) = payload?;
    if new.bmc_code.trim().is_empty() || new.name.trim().is_empty() || new.address.is_empty() {
        return Err(ApiError::bad_request("bmcCode, name, address are required"));
    }
    let bmc_code = new.bmc_code.trim().to_string();
    if state.bmcs().get(&bmc_code)?.is_none() {
        return Err(ApiError::not_found("BMC not found"));
    }

    let mpp = state.mpps().create(new)?;
    // The BMC may have been deleted since the check above
    if !state.bmcs().attach_mpp(&bmc_code, mpp.id)? {
        state.mpps().delete(&mpp.mpp_code)?;
        return Err(ApiError::not_found("BMC not found"));
    }
    state.mpc().add(Member::Mpp, mpp.id)?;
    tracing::info!(mpp_code = %mpp.mpp_code, bmc_code = %bmc_code, "MPP created");

    audit(
        &state,
        &caller,
        AuditRequest::builder(ActionType::Create, EntityType::Mpp)
            .entity_id(mpp.id)
            .old_data(Value::Null)
            .new_data(snapshot(&mpp))
            .reason("MPP created"),
    )
    .await;

    Ok(ApiResponse::created(mpp, "MPP created successfully"))
}

/// `GET /mpps`
pub async fn list_mpps(
    State(state): State<AppState>,
    caller: CallerContext,
) -> Result<ApiResponse<Vec<Mpp>>, ApiError> {
    let mpps = state.mpps().list()?;

    audit(
        &state,
        &caller,
        AuditRequest::builder(ActionType::Retrieve, EntityType::Mpp).reason("Retrieved all MPPs"),
    )
    .await;

    Ok(ApiResponse::ok(mpps, "MPPs retrieved successfully"))
}

/// `GET /mpps/{mpp_code}`
pub async fn get_mpp(
    State(state): State<AppState>,
    Path(mpp_code): Path<String>,
    caller: CallerContext,
) -> Result<ApiResponse<Mpp>, ApiError> {
    let mpp = state
        .mpps()
        .get(&mpp_code)?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    audit(
        &state,
        &caller,
        AuditRequest::builder(ActionType::Retrieve, EntityType::Mpp)
            .entity_id(mpp.id)
            .reason("Retrieved MPP"),
    )
    .await;

    Ok(ApiResponse::ok(mpp, "MPP retrieved successfully"))
}

/// `PUT /mpps/{mpp_code}`
pub async fn update_mpp(
    State(state): State<AppState>,
    Path(mpp_code): Path<String>,
    caller: CallerContext,
    payload: Result<Json<MppUpdate>, JsonRejection>,
) -> Result<ApiResponse<Mpp>, ApiError> {
    let Json(update) = payload?;
    if update.is_empty() {
        return Err(ApiError::bad_request("No fields provided to update"));
    }

    let updated = state
        .mpps()
        .update(&mpp_code, update)?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    audit(
        &state,
        &caller,
        AuditRequest::builder(ActionType::Update, EntityType::Mpp)
            .entity_id(updated.after.id)
            .old_data(snapshot(&updated.before))
            .new_data(snapshot(&updated.after))
            .reason("MPP updated"),
    )
    .await;

    Ok(ApiResponse::ok(updated.after, "MPP updated successfully"))
}

/// `DELETE /mpps/{mpp_code}`
pub async fn delete_mpp(
    State(state): State<AppState>,
    Path(mpp_code): Path<String>,
    caller: CallerContext,
) -> Result<ApiResponse<Value>, ApiError> {
    let deleted = state
        .mpps()
        .delete(&mpp_code)?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    state.bmcs().detach_mpp(&deleted.bmc_code, deleted.id)?;
    state.mpc().remove(deleted.id)?;
    tracing::info!(mpp_code = %deleted.mpp_code, "MPP deleted");

    audit(
        &state,
        &caller,
        AuditRequest::builder(ActionType::Delete, EntityType::Mpp)
            .entity_id(deleted.id)
            .old_data(snapshot(&deleted))
            .reason("MPP deleted"),
    )
    .await;

    Ok(ApiResponse::ok(json!({}), "MPP deleted successfully"))
}
