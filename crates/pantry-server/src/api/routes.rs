use axum::{
    extract::{Query, State},
    Extension, Json,
};
use pantry_core::Coordinate;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{require_finite, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct RouteQuery {
    pub from_lat: f64,
    pub from_lng: f64,
    pub to_lat: f64,
    pub to_lng: f64,
}

#[derive(Debug, Serialize)]
pub(super) struct RouteData {
    pub points: Vec<Coordinate>,
}

/// GET /api/v1/routes
///
/// Driving polyline between two points, or the straight segment when the
/// routing service cannot answer.
pub(super) async fn get_route(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<ApiResponse<RouteData>>, ApiError> {
    let rid = &req_id.0;
    require_finite(rid, "from_lat", query.from_lat)?;
    require_finite(rid, "from_lng", query.from_lng)?;
    require_finite(rid, "to_lat", query.to_lat)?;
    require_finite(rid, "to_lng", query.to_lng)?;

    let from = Coordinate::new(query.from_lat, query.from_lng);
    let to = Coordinate::new(query.to_lat, query.to_lng);
    let points = state.routes.route_or_straight(from, to).await;
    Ok(ApiResponse::new(&req_id, RouteData { points }))
}
