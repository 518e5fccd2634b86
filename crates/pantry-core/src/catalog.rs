use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const DEFAULT_BRANDS: &[&str] = &[
    "家樂福 (Carrefour)",
    "全聯福利中心 (PX Mart)",
    "頂好 (Wellcome)",
    "美聯社 (Simple Mart)",
];

const DEFAULT_MANDATORY_ITEMS: &[&str] = &[
    "Beef",
    "Pork",
    "Chicken",
    "Rice",
    "Fish",
    "Eggplant",
    "Vegetables",
    "Potato",
    "Tomato",
    "Chili",
    "Green Pepper",
    "Onion",
    "Noodles",
    "Flour",
    "Pasta Noodles",
];

const DEFAULT_SECONDARY_ITEMS: &[&str] = &[
    "Spinach",
    "Lettuce",
    "Kale",
    "Garlic",
    "Leek",
    "Apple",
    "Banana",
    "Citrus",
    "Mushrooms",
    "Ground Beef",
    "Steak",
    "Salmon",
    "Eggs",
    "Tofu",
    "Sugar",
    "Salt",
    "Vegetable Oil",
    "Olive Oil",
    "Soy Sauce",
    "Vinegar",
    "Pepper",
    "Milk",
    "Cheese",
    "Butter",
];

const DEFAULT_VIRTUAL_HUB_NAME: &str = "家樂福 Carrefour (Virtual Hub)";

/// Brand names and goods used to synthesize the local supplier pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub brands: Vec<String>,
    /// Stocked by every supplier, always with a positive quantity.
    pub mandatory_items: Vec<String>,
    /// Stocked by some suppliers; others list them at zero.
    pub secondary_items: Vec<String>,
    #[serde(default = "default_virtual_hub_name")]
    pub virtual_hub_name: String,
}

fn default_virtual_hub_name() -> String {
    DEFAULT_VIRTUAL_HUB_NAME.to_string()
}

impl Default for Catalog {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| (*s).to_string()).collect();
        Self {
            brands: owned(DEFAULT_BRANDS),
            mandatory_items: owned(DEFAULT_MANDATORY_ITEMS),
            secondary_items: owned(DEFAULT_SECONDARY_ITEMS),
            virtual_hub_name: default_virtual_hub_name(),
        }
    }
}

impl Catalog {
    /// Every item name the pool can stock, mandatory first, in display case.
    #[must_use]
    pub fn inventory_keys(&self) -> Vec<String> {
        self.mandatory_items
            .iter()
            .chain(&self.secondary_items)
            .cloned()
            .collect()
    }
}

/// Load and validate a catalog override from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<Catalog, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let catalog: Catalog = serde_yaml::from_str(&content)?;
    validate_catalog(&catalog)?;

    Ok(catalog)
}

fn validate_catalog(catalog: &Catalog) -> Result<(), ConfigError> {
    if catalog.brands.is_empty() {
        return Err(ConfigError::Validation(
            "catalog must list at least one brand".to_string(),
        ));
    }
    if catalog.brands.iter().any(|b| b.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "brand name must be non-empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for item in catalog.mandatory_items.iter().chain(&catalog.secondary_items) {
        if item.trim().is_empty() {
            return Err(ConfigError::Validation(
                "item name must be non-empty".to_string(),
            ));
        }
        if !seen.insert(item.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate catalog item: '{item}'"
            )));
        }
    }

    Ok(())
}
