//! Choosing which suppliers fill a shopping list.

use std::fmt;
use std::sync::Arc;

use pantry_core::{Coordinate, Ingredient, Landmark, Shipment, Supplier};
use rand::Rng;

use crate::geo::distance_km;
use crate::matcher::{InventoryMatcher, SubstringMatcher};
use crate::timing::TimingModel;
use crate::virtual_supplier::VirtualSupplierFactory;

/// Builds sourcing plans: at most one real shipment plus at most one
/// virtual shipment for whatever the real supplier cannot cover.
pub struct SourcingPlanner {
    matcher: Box<dyn InventoryMatcher>,
    timing: TimingModel,
    virtuals: VirtualSupplierFactory,
}

impl fmt::Debug for SourcingPlanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourcingPlanner")
            .field("timing", &self.timing)
            .field("virtuals", &self.virtuals)
            .finish_non_exhaustive()
    }
}

struct Candidate<'a> {
    supplier: &'a Arc<Supplier>,
    distance: f64,
    matched: Vec<bool>,
    match_count: usize,
}

impl SourcingPlanner {
    /// Planner with substring matching and the default timing model.
    /// `hub_name` labels virtual suppliers created without a landmark.
    pub fn new(hub_name: impl Into<String>) -> Self {
        Self {
            matcher: Box::new(SubstringMatcher),
            timing: TimingModel::default(),
            virtuals: VirtualSupplierFactory::new(hub_name),
        }
    }

    #[must_use]
    pub fn with_matcher(mut self, matcher: impl InventoryMatcher + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    #[must_use]
    pub fn with_timing(mut self, timing: TimingModel) -> Self {
        self.timing = timing;
        self
    }

    fn shipment<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        supplier: Arc<Supplier>,
        items: Vec<Ingredient>,
        distance: f64,
    ) -> Shipment {
        let timing = self.timing.estimate(rng, distance);
        Shipment {
            supplier,
            items,
            distance,
            eta: timing.eta,
            travel_time: timing.travel_time,
        }
    }

    /// Cover `required` from `suppliers`, falling back to a virtual supplier
    /// for anything left over.
    ///
    /// 1. The nearest supplier that can fill every line wins outright.
    /// 2. Otherwise the supplier filling the most lines (nearest on ties)
    ///    ships its matched lines, provided it matches at least one.
    /// 3. Remaining lines ship from a virtual supplier, placed at `landmark`
    ///    when one is given.
    ///
    /// Every line of `required` appears in exactly one shipment. Ties keep
    /// pool order. An empty list with an empty pool yields no shipments.
    pub fn create_sourcing_plan<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        user_loc: Coordinate,
        required: &[Ingredient],
        suppliers: &[Arc<Supplier>],
        landmark: Option<&Landmark>,
    ) -> Vec<Shipment> {
        let candidates: Vec<Candidate<'_>> = suppliers
            .iter()
            .map(|supplier| {
                let matched: Vec<bool> = required
                    .iter()
                    .map(|item| self.matcher.can_supply(supplier, item))
                    .collect();
                Candidate {
                    supplier,
                    distance: distance_km(user_loc, supplier.location),
                    match_count: matched.iter().filter(|m| **m).count(),
                    matched,
                }
            })
            .collect();

        // min_by keeps the first of equal elements, so ties resolve to pool order.
        let perfect = candidates
            .iter()
            .filter(|c| c.match_count == required.len())
            .min_by(|a, b| a.distance.total_cmp(&b.distance));

        if let Some(best) = perfect {
            tracing::debug!(
                supplier = %best.supplier.id,
                distance_km = best.distance,
                "single supplier covers the full list"
            );
            return vec![self.shipment(
                rng,
                Arc::clone(best.supplier),
                required.to_vec(),
                best.distance,
            )];
        }

        if required.is_empty() {
            return Vec::new();
        }

        let best = candidates.iter().min_by(|a, b| {
            b.match_count
                .cmp(&a.match_count)
                .then_with(|| a.distance.total_cmp(&b.distance))
        });

        let mut plan = Vec::with_capacity(2);
        let mut remaining = Vec::new();

        match best {
            Some(best) if best.match_count > 0 => {
                let mut covered = Vec::with_capacity(best.match_count);
                for (item, matched) in required.iter().zip(&best.matched) {
                    if *matched {
                        covered.push(item.clone());
                    } else {
                        remaining.push(item.clone());
                    }
                }
                tracing::debug!(
                    supplier = %best.supplier.id,
                    covered = covered.len(),
                    remaining = remaining.len(),
                    "partial coverage from nearest best supplier"
                );
                plan.push(self.shipment(
                    rng,
                    Arc::clone(best.supplier),
                    covered,
                    best.distance,
                ));
            }
            _ => remaining.extend_from_slice(required),
        }

        if !remaining.is_empty() {
            let virtual_supplier =
                self.virtuals
                    .create_virtual_supplier(rng, user_loc, &remaining, landmark);
            let distance = distance_km(user_loc, virtual_supplier.location);
            tracing::info!(
                supplier = %virtual_supplier.id,
                name = %virtual_supplier.name,
                items = remaining.len(),
                "virtual supplier covers leftover items"
            );
            plan.push(self.shipment(rng, Arc::new(virtual_supplier), remaining, distance));
        }

        plan
    }
}

#[cfg(test)]
#[path = "planner_test.rs"]
mod tests;
