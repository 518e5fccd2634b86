//! Deciding whether one supplier can fill one shopping-list line.

use pantry_core::{Ingredient, Supplier};

/// Availability check used by the planner.
pub trait InventoryMatcher: Send + Sync {
    /// `true` when `supplier` stocks enough of `required`.
    fn can_supply(&self, supplier: &Supplier, required: &Ingredient) -> bool;
}

/// Loose substring matching.
///
/// The lowercased ingredient name matches an inventory key when either one
/// contains the other. The first such key in stocking order decides; keys
/// are not ranked, so "pepper" may resolve to "green pepper".
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatcher;

impl InventoryMatcher for SubstringMatcher {
    fn can_supply(&self, supplier: &Supplier, required: &Ingredient) -> bool {
        let wanted = required.name.to_lowercase();
        supplier
            .inventory
            .iter()
            .find(|(key, _)| wanted.contains(key) || key.contains(wanted.as_str()))
            .is_some_and(|(_, qty)| qty > 0.0 && qty >= required.quantity)
    }
}

/// Strict matching on normalized names (trimmed, lowercased, single spaces).
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactNameMatcher;

fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl InventoryMatcher for ExactNameMatcher {
    fn can_supply(&self, supplier: &Supplier, required: &Ingredient) -> bool {
        let wanted = normalize(&required.name);
        supplier
            .inventory
            .iter()
            .find(|(key, _)| normalize(key) == wanted)
            .is_some_and(|(_, qty)| qty > 0.0 && qty >= required.quantity)
    }
}

/// [`SubstringMatcher`] as a plain function.
#[must_use]
pub fn has_ingredient(supplier: &Supplier, required: &Ingredient) -> bool {
    SubstringMatcher.can_supply(supplier, required)
}
