use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::inventory::Inventory;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A required or supplied quantity of a named good.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit: unit.into(),
        }
    }
}

/// A store that can fulfil part or all of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub location: Coordinate,
    /// Lowercase item name to available quantity, in insertion order.
    pub inventory: Inventory,
    #[serde(default)]
    pub is_virtual: bool,
}

/// A known real-world supermarket returned by the landmark lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub name: String,
    pub location: Coordinate,
}

/// One supplier's share of a sourcing plan.
///
/// The supplier is shared with the pool it came from; planning never
/// mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub supplier: Arc<Supplier>,
    pub items: Vec<Ingredient>,
    /// Distance from the customer in km.
    pub distance: f64,
    /// Human-readable arrival estimate, e.g. `"23 mins"`.
    pub eta: String,
    /// Driving time in whole minutes, before prep time.
    pub travel_time: u32,
}
