pub mod app_config;
pub mod catalog;
pub mod config;
pub mod demand;
pub mod inventory;
pub mod order;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use catalog::{load_catalog, Catalog};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use demand::{is_cancel_request, parse_headcount, Demand};
pub use inventory::Inventory;
pub use order::{total_travel_minutes, OrderDetails, OrderError, OrderStatus, RecipeAnalysis};
pub use types::{Coordinate, Ingredient, Landmark, Shipment, Supplier};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read catalog file {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog file: {0}")]
    CatalogFileParse(#[from] serde_yaml::Error),

    #[error("catalog validation failed: {0}")]
    Validation(String),
}
