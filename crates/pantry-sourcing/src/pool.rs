//! Local supplier pool generation and the session cache that keeps it stable.
//!
//! The ordering flow and the manager dashboard must see the same suppliers
//! and stock numbers for a whole session, so both read through one
//! [`SupplierPool`] instead of generating their own.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pantry_core::{AppConfig, Catalog, Coordinate, Inventory, Supplier};
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::geo::{distance_km, random_point_in_disk};

const SECONDARY_STOCK_PROBABILITY: f64 = 0.7;

#[derive(Debug, Clone, PartialEq)]
pub struct PoolSettings {
    /// Number of suppliers per generated pool.
    pub size: usize,
    /// Suppliers are scattered uniformly inside this radius.
    pub radius_km: f64,
    /// A cached pool is reused while requests stay within this distance of
    /// its centre.
    pub reuse_radius_km: f64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            size: 30,
            radius_km: 15.0,
            reuse_radius_km: 2.0,
        }
    }
}

impl PoolSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            size: config.pool_size,
            radius_km: config.pool_radius_km,
            reuse_radius_km: config.pool_reuse_radius_km,
        }
    }
}

/// Synthesize a fresh pool around `center`, ignoring any cache.
///
/// Mandatory items are always stocked at 50..500. Secondary items are
/// stocked at 10..210 with probability 0.7 and otherwise listed at zero.
pub fn build_supplier_pool<R: Rng + ?Sized>(
    rng: &mut R,
    catalog: &Catalog,
    center: Coordinate,
    settings: &PoolSettings,
) -> Vec<Supplier> {
    let item_count = catalog.mandatory_items.len() + catalog.secondary_items.len();

    (0..settings.size)
        .map(|i| {
            let brand = catalog
                .brands
                .choose(rng)
                .map_or("Supplier", String::as_str);
            let branch: u32 = rng.random_range(100..1000);

            let mut inventory = Inventory::with_capacity(item_count);
            for item in &catalog.mandatory_items {
                let qty: u32 = rng.random_range(50..500);
                inventory.insert(item.to_lowercase(), f64::from(qty));
            }
            for item in &catalog.secondary_items {
                let qty: u32 = if rng.random_bool(SECONDARY_STOCK_PROBABILITY) {
                    rng.random_range(10..210)
                } else {
                    0
                };
                inventory.insert(item.to_lowercase(), f64::from(qty));
            }

            Supplier {
                id: format!("sup-{i}"),
                name: format!("{brand} #{branch}"),
                location: random_point_in_disk(rng, center, settings.radius_km),
                inventory,
                is_virtual: false,
            }
        })
        .collect()
}

#[derive(Debug)]
struct CachedPool {
    center: Coordinate,
    suppliers: Vec<Arc<Supplier>>,
}

/// Session-scoped supplier cache.
///
/// Holds at most one pool. The read-then-replace in
/// [`SupplierPool::generate_suppliers`] happens under one lock, so concurrent
/// callers never generate two pools for the same neighbourhood.
#[derive(Debug)]
pub struct SupplierPool {
    catalog: Catalog,
    settings: PoolSettings,
    state: Mutex<Option<CachedPool>>,
}

impl SupplierPool {
    #[must_use]
    pub fn new(catalog: Catalog, settings: PoolSettings) -> Self {
        Self {
            catalog,
            settings,
            state: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    fn lock(&self) -> MutexGuard<'_, Option<CachedPool>> {
        // The guarded value is replaced wholesale, so a poisoned lock still
        // holds a consistent pool.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached pool when `center` is close to the cached centre,
    /// otherwise generate, cache and return a new one.
    pub fn generate_suppliers<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        center: Coordinate,
    ) -> Vec<Arc<Supplier>> {
        let mut state = self.lock();

        if let Some(cached) = state.as_ref() {
            let moved_km = distance_km(center, cached.center);
            if !cached.suppliers.is_empty() && moved_km < self.settings.reuse_radius_km {
                tracing::debug!(moved_km, "reusing cached supplier pool");
                return cached.suppliers.clone();
            }
            tracing::debug!(moved_km, "center moved; regenerating supplier pool");
        }

        let suppliers: Vec<Arc<Supplier>> =
            build_supplier_pool(rng, &self.catalog, center, &self.settings)
                .into_iter()
                .map(Arc::new)
                .collect();

        tracing::info!(
            lat = center.lat,
            lng = center.lng,
            count = suppliers.len(),
            "generated supplier pool"
        );

        *state = Some(CachedPool {
            center,
            suppliers: suppliers.clone(),
        });
        suppliers
    }

    /// The current pool, or an empty list before the first generation.
    #[must_use]
    pub fn active(&self) -> Vec<Arc<Supplier>> {
        self.lock()
            .as_ref()
            .map(|cached| cached.suppliers.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn center(&self) -> Option<Coordinate> {
        self.lock().as_ref().map(|cached| cached.center)
    }

    pub fn clear(&self) {
        *self.lock() = None;
        tracing::debug!("supplier pool cache cleared");
    }
}
