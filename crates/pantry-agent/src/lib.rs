//! Clients for the services the ordering assistant leans on: a grounded
//! generative model for recipes and supermarket lookup, and a routing
//! engine for delivery paths.

pub mod error;
pub mod gemini;
mod json;
pub mod landmark;
pub mod recipe;
mod retry;
pub mod routing;

pub use error::AgentError;
pub use gemini::{GeminiClient, Generation, GroundingTool, DEFAULT_MODEL};
pub use landmark::LandmarkLocator;
pub use recipe::RecipeAnalyst;
pub use routing::RouteClient;
