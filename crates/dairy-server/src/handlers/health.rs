use axum::extract::State;
use dairy_audit::{ActionType, AuditRequest, EntityType, SYSTEM_PRINCIPAL};
use serde_json::Value;

use super::audit;
use crate::context::CallerContext;
use crate::response::ApiResponse;
use crate::state::AppState;

/// `GET /healthcheck`
pub async fn healthcheck(State(state): State<AppState>, caller: CallerContext) -> ApiResponse<Value> {
    if state.audit().config().log_healthchecks {
        audit(
            &state,
            &caller,
            AuditRequest::builder(ActionType::Healthcheck, EntityType::SystemCheck)
                .performed_by(SYSTEM_PRINCIPAL)
                .reason("Healthcheck"),
        )
        .await;
    }
    ApiResponse::ok(Value::Null, "Healthcheck is OK")
}
