//! Supplier sourcing for meal orders.
//!
//! Builds a reproducible pool of nearby suppliers, decides which of them can
//! cover a shopping list, and turns the choice into timed shipments. All
//! randomness is drawn from a caller-supplied [`rand::Rng`] so a seeded
//! generator reproduces a session exactly.

pub mod geo;
pub mod matcher;
pub mod planner;
pub mod pool;
pub mod report;
pub mod timing;
pub mod virtual_supplier;

pub use geo::{distance_km, KM_PER_DEGREE};
pub use matcher::{has_ingredient, ExactNameMatcher, InventoryMatcher, SubstringMatcher};
pub use planner::SourcingPlanner;
pub use pool::{build_supplier_pool, PoolSettings, SupplierPool};
pub use report::{inventory_reports, InventoryReport, StockLine};
pub use timing::{calculate_timing, Timing, TimingModel};
pub use virtual_supplier::{VirtualSupplierFactory, VIRTUAL_STOCK};
