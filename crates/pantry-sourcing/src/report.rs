//! Manager-facing stock view of the active supplier pool.

use std::sync::Arc;

use pantry_core::{Coordinate, Supplier};
use serde::Serialize;

use crate::geo::distance_km;

/// Quantities below this are flagged for restocking.
pub const LOW_STOCK_THRESHOLD: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockLine {
    pub item: String,
    pub quantity: f64,
    pub low_stock: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryReport {
    pub id: String,
    pub name: String,
    pub location: Coordinate,
    pub is_virtual: bool,
    /// Distance from the viewer, when the viewer's location is known.
    pub distance_km: Option<f64>,
    /// In-stock lines only, largest quantity first.
    pub items: Vec<StockLine>,
    pub total_sku: usize,
}

impl InventoryReport {
    #[must_use]
    pub fn for_supplier(supplier: &Supplier, viewer: Option<Coordinate>) -> Self {
        let mut items: Vec<StockLine> = supplier
            .inventory
            .iter()
            .filter(|(_, qty)| *qty > 0.0)
            .map(|(item, quantity)| StockLine {
                item: item.to_string(),
                quantity,
                low_stock: quantity < LOW_STOCK_THRESHOLD,
            })
            .collect();
        items.sort_by(|a, b| {
            b.quantity
                .total_cmp(&a.quantity)
                .then_with(|| a.item.cmp(&b.item))
        });

        Self {
            id: supplier.id.clone(),
            name: supplier.name.clone(),
            location: supplier.location,
            is_virtual: supplier.is_virtual,
            distance_km: viewer.map(|at| distance_km(at, supplier.location)),
            total_sku: items.len(),
            items,
        }
    }
}

/// One report per supplier, in pool order.
#[must_use]
pub fn inventory_reports(
    suppliers: &[Arc<Supplier>],
    viewer: Option<Coordinate>,
) -> Vec<InventoryReport> {
    suppliers
        .iter()
        .map(|supplier| InventoryReport::for_supplier(supplier, viewer))
        .collect()
}
