//! Manager dashboard: stock levels of the active supplier pool.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use pantry_core::Coordinate;
use pantry_sourcing::{inventory_reports, InventoryReport};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ViewerQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl ViewerQuery {
    fn viewer(&self) -> Option<Coordinate> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => {
                Some(Coordinate::new(lat, lng))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ClearedData {
    pub cleared: bool,
}

/// GET /api/v1/manager/suppliers
pub(super) async fn list_suppliers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ViewerQuery>,
) -> Json<ApiResponse<Vec<InventoryReport>>> {
    let pool = state.session.pool();
    let reports = inventory_reports(&pool.active(), query.viewer());
    ApiResponse::new(&req_id, reports)
}

/// DELETE /api/v1/manager/suppliers
///
/// Drops the cached pool; the next plan regenerates it.
pub(super) async fn clear_suppliers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<ClearedData>> {
    state.session.pool().clear();
    tracing::info!("supplier pool cleared by manager");
    ApiResponse::new(&req_id, ClearedData { cleared: true })
}
