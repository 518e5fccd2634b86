use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use pantry_core::{Coordinate, Ingredient, OrderDetails, OrderError};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{json_body, require_finite, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct PlanRequest {
    pub location: Coordinate,
    pub ingredients: Vec<Ingredient>,
}

fn validate_plan(rid: &str, body: &PlanRequest) -> Result<(), ApiError> {
    require_finite(rid, "location.lat", body.location.lat)?;
    require_finite(rid, "location.lng", body.location.lng)?;
    if body.ingredients.is_empty() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "at least one ingredient is required",
        ));
    }
    for ingredient in &body.ingredients {
        if ingredient.name.trim().is_empty() {
            return Err(ApiError::new(
                rid,
                "validation_error",
                "ingredient names must not be empty",
            ));
        }
        if !ingredient.quantity.is_finite() || ingredient.quantity < 0.0 {
            return Err(ApiError::new(
                rid,
                "validation_error",
                format!(
                    "quantity for {} must be a non-negative number",
                    ingredient.name
                ),
            ));
        }
    }
    Ok(())
}

/// POST /api/v1/orders/plan
///
/// Sources the ingredients around the customer and dispatches the order.
pub(super) async fn plan_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<PlanRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<OrderDetails>>, ApiError> {
    let rid = &req_id.0;
    let body = json_body(&req_id, body)?;
    validate_plan(rid, &body)?;

    let session = &state.session;
    let generation = session.begin_sourcing();
    let suppliers = session.suppliers_near(body.location);

    let landmark = match state.locator.as_ref() {
        Some(locator) => {
            let brands = &session.pool().catalog().brands;
            locator.nearest_supermarket(body.location, brands).await
        }
        None => None,
    };

    let shipments = session.plan(
        body.location,
        &body.ingredients,
        &suppliers,
        landmark.as_ref(),
    );
    let order = session.dispatch(generation, shipments).ok_or_else(|| {
        ApiError::new(
            rid,
            "conflict",
            "order was cancelled or replaced while sourcing",
        )
    })?;
    Ok(ApiResponse::new(&req_id, order))
}

/// GET /api/v1/orders/current
pub(super) async fn current_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<OrderDetails>> {
    ApiResponse::new(&req_id, state.session.current_order())
}

/// POST /api/v1/orders/cancel
pub(super) async fn cancel_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<OrderDetails>>, ApiError> {
    state
        .session
        .cancel()
        .map(|order| ApiResponse::new(&req_id, order))
        .map_err(|e: OrderError| ApiError::new(&req_id.0, "conflict", e.to_string()))
}
