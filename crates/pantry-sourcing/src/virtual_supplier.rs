//! Stand-in supplier for items no real store can cover.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use pantry_core::{Coordinate, Ingredient, Inventory, Landmark, Supplier};
use rand::Rng;

use crate::geo::random_offset;

/// Quantity stocked for every item a virtual supplier is created for.
pub const VIRTUAL_STOCK: f64 = 10_000.0;

const MIN_HUB_OFFSET_DEG: f64 = 0.05;
const MAX_HUB_OFFSET_DEG: f64 = 0.10;

/// Creates virtual suppliers with ids unique for the factory's lifetime.
///
/// Ids are `virtual-{unix_millis}-{seq}`; the sequence number keeps two
/// suppliers created in the same millisecond apart.
#[derive(Debug)]
pub struct VirtualSupplierFactory {
    hub_name: String,
    seq: AtomicU64,
}

impl VirtualSupplierFactory {
    pub fn new(hub_name: impl Into<String>) -> Self {
        Self {
            hub_name: hub_name.into(),
            seq: AtomicU64::new(0),
        }
    }

    fn next_id(&self) -> String {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        format!("virtual-{}-{seq}", Utc::now().timestamp_millis())
    }

    /// Build a supplier stocking every item in `items` at [`VIRTUAL_STOCK`].
    ///
    /// With a landmark the supplier takes its name and location; otherwise it
    /// is the generic hub placed 0.05 to 0.10 degrees from the customer.
    pub fn create_virtual_supplier<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        user_loc: Coordinate,
        items: &[Ingredient],
        landmark: Option<&Landmark>,
    ) -> Supplier {
        let (name, location) = match landmark {
            Some(landmark) => (landmark.name.clone(), landmark.location),
            None => (
                self.hub_name.clone(),
                random_offset(rng, user_loc, MIN_HUB_OFFSET_DEG, MAX_HUB_OFFSET_DEG),
            ),
        };

        let inventory: Inventory = items
            .iter()
            .map(|item| (item.name.to_lowercase(), VIRTUAL_STOCK))
            .collect();

        Supplier {
            id: self.next_id(),
            name,
            location,
            inventory,
            is_virtual: true,
        }
    }
}
