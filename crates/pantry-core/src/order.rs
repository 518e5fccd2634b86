use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Ingredient, Shipment};

/// A recipe resolved from a meal description, expressed as a shopping list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeAnalysis {
    pub recipe_name: String,
    #[serde(default)]
    pub recipe_url: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Analyzing,
    Sourcing,
    Packaging,
    Delivering,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// `true` once the order can no longer change.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    #[must_use]
    pub fn can_cancel(self) -> bool {
        !self.is_terminal()
    }

    /// Sourcing or delivery has started; a new demand would clash with it.
    #[must_use]
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            OrderStatus::Sourcing | OrderStatus::Packaging | OrderStatus::Delivering
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Analyzing => "ANALYZING",
            OrderStatus::Sourcing => "SOURCING",
            OrderStatus::Packaging => "PACKAGING",
            OrderStatus::Delivering => "DELIVERING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("order is already {0} and cannot be cancelled")]
    NotCancellable(OrderStatus),
}

/// Session-level order state shared with the map and chat views.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub meal: String,
    pub headcount: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<RecipeAnalysis>,
    pub shipments: Vec<Shipment>,
    pub status: OrderStatus,
}

impl OrderDetails {
    /// Cancel the order unless it already completed or was cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NotCancellable`] for terminal orders.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if !self.status.can_cancel() {
            return Err(OrderError::NotCancellable(self.status));
        }
        self.status = OrderStatus::Cancelled;
        Ok(())
    }
}

/// Longest travel time across a plan, in minutes. Deliveries run in
/// parallel so the order completes when the slowest one arrives.
#[must_use]
pub fn total_travel_minutes(shipments: &[Shipment]) -> u32 {
    shipments.iter().map(|s| s.travel_time).max().unwrap_or(0)
}
