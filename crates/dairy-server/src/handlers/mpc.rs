//! Read-only views of the MPC aggregate.

use axum::extract::State;
use chrono::{DateTime, Utc};
use dairy_audit::{ActionType, AuditRecord, AuditRequest, EntityType};
use dairy_core::{Bmc, MpcCounts, Mpp, User};
use serde::Serialize;

use super::audit;
use crate::context::CallerContext;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

/// The MPC with its member ids resolved to entities.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MpcDetails {
    pub bmcs: Vec<Bmc>,
    pub mpps: Vec<Mpp>,
    pub farmers: Vec<User>,
    pub staffs: Vec<User>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MpcCountsData {
    pub counts: MpcCounts,
    /// The record written for this read, absent if the write failed.
    pub audit_log: Option<AuditRecord>,
}

/// `GET /mpcs/details`
pub async fn details(
    State(state): State<AppState>,
    caller: CallerContext,
) -> Result<ApiResponse<MpcDetails>, ApiError> {
    let mpc = state.mpc().snapshot()?;
    let details = MpcDetails {
        bmcs: state.bmcs().get_many(&mpc.bmcs)?,
        mpps: state.mpps().get_many(&mpc.mpps)?,
        farmers: state.users().get_many(&mpc.farmers)?,
        staffs: state.users().get_many(&mpc.staffs)?,
        created_at: mpc.created_at,
        updated_at: mpc.updated_at,
    };

    audit(
        &state,
        &caller,
        AuditRequest::builder(ActionType::Retrieve, EntityType::Mpc).reason("Retrieved all MPCs"),
    )
    .await;

    Ok(ApiResponse::ok(details, "MPC details retrieved successfully"))
}

/// `GET /mpcs/counts`
pub async fn counts(
    State(state): State<AppState>,
    caller: CallerContext,
) -> Result<ApiResponse<MpcCountsData>, ApiError> {
    let counts = state.mpc().counts()?;

    let audit_log = audit(
        &state,
        &caller,
        AuditRequest::builder(ActionType::Retrieve, EntityType::Mpc).reason("Retrieved MPC counts"),
    )
    .await;

    Ok(ApiResponse::ok(
        MpcCountsData { counts, audit_log },
        "MPC counts retrieved successfully",
    ))
}
