//! Chat-message intake: meal and headcount gathering, plus "cancel".

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use pantry_core::{is_cancel_request, Demand, OrderDetails};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{json_body, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct DemandRequest {
    pub message: String,
    #[serde(default)]
    pub pending_meal: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub(super) enum DemandOutcome {
    Parsed { demand: Demand },
    Cancelled { order: OrderDetails },
    /// An order is already on its way; only "cancel" is acted on.
    InProgress { order: OrderDetails },
}

/// POST /api/v1/demand
pub(super) async fn parse_demand(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<DemandRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<DemandOutcome>>, ApiError> {
    let body = json_body(&req_id, body)?;
    let message = body.message.trim();
    if message.is_empty() {
        return Err(ApiError::new(
            &req_id.0,
            "validation_error",
            "message must not be empty",
        ));
    }

    let order = state.session.current_order();
    if order.status.is_in_flight() {
        if is_cancel_request(message) {
            let cancelled = state
                .session
                .cancel()
                .map_err(|e| ApiError::new(&req_id.0, "conflict", e.to_string()))?;
            return Ok(ApiResponse::new(
                &req_id,
                DemandOutcome::Cancelled { order: cancelled },
            ));
        }
        return Ok(ApiResponse::new(&req_id, DemandOutcome::InProgress { order }));
    }

    let pending = body
        .pending_meal
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());
    let demand = Demand::from_message(pending, message);
    tracing::debug!(?demand, "demand parsed");
    Ok(ApiResponse::new(&req_id, DemandOutcome::Parsed { demand }))
}
