use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use pantry_core::OrderDetails;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{json_body, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeRequest {
    pub meal: String,
    pub headcount: u32,
    /// Ask for a different take on the same dish.
    #[serde(default)]
    pub variation: bool,
}

/// POST /api/v1/recipes/analyze
pub(super) async fn analyze_recipe(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<OrderDetails>>, ApiError> {
    let rid = &req_id.0;
    let body = json_body(&req_id, body)?;

    let meal = body.meal.trim();
    if meal.is_empty() || body.headcount == 0 {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "meal must be non-empty and headcount at least 1",
        ));
    }

    let Some(analyst) = state.analyst.as_ref() else {
        return Err(ApiError::new(
            rid,
            "upstream_unavailable",
            "recipe analysis is not configured",
        ));
    };

    let generation = state
        .session
        .begin_analysis(meal, body.headcount)
        .map_err(|status| {
            ApiError::new(
                rid,
                "conflict",
                format!("an order is already {status}; cancel it first"),
            )
        })?;

    let inventory_keys = state.session.pool().catalog().inventory_keys();
    let recipe = analyst
        .analyze(meal, body.headcount, &inventory_keys, body.variation)
        .await;
    let found = recipe.is_some();
    let order = state
        .session
        .finish_analysis(generation, recipe)
        .ok_or_else(|| {
            ApiError::new(
                rid,
                "conflict",
                "order was cancelled or replaced while the recipe was analysed",
            )
        })?;

    if !found {
        return Err(ApiError::new(
            rid,
            "unprocessable",
            "could not work out a recipe for that meal; please rephrase the request",
        ));
    }
    tracing::info!(meal, headcount = body.headcount, "recipe analysed");
    Ok(ApiResponse::new(&req_id, order))
}
