//! Finding a real supermarket to stand in for the virtual supplier.

use pantry_core::{Coordinate, Landmark};
use serde::Deserialize;

use crate::error::AgentError;
use crate::gemini::{GeminiClient, GroundingTool};
use crate::json::extract_json_object;

#[derive(Debug, Deserialize)]
struct FoundStore {
    name: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
}

impl FoundStore {
    /// A store needs a name and both coordinates; zero counts as missing.
    fn into_landmark(self) -> Option<Landmark> {
        let name = self.name.filter(|n| !n.trim().is_empty())?;
        let lat = self.lat.filter(|v| *v != 0.0 && v.is_finite())?;
        let lng = self.lng.filter(|v| *v != 0.0 && v.is_finite())?;
        Some(Landmark {
            name,
            location: Coordinate::new(lat, lng),
        })
    }
}

/// Map-grounded supermarket lookup.
#[derive(Debug, Clone)]
pub struct LandmarkLocator {
    gemini: GeminiClient,
}

impl LandmarkLocator {
    #[must_use]
    pub fn new(gemini: GeminiClient) -> Self {
        Self { gemini }
    }

    /// Nearest store of one of `brands` around `location`.
    ///
    /// The landmark is optional decoration for the fallback supplier, so any
    /// failure is logged and reported as `None`.
    pub async fn nearest_supermarket(
        &self,
        location: Coordinate,
        brands: &[String],
    ) -> Option<Landmark> {
        match self.try_nearest_supermarket(location, brands).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(error = %e, "supermarket lookup failed");
                None
            }
        }
    }

    /// # Errors
    ///
    /// Returns the transport error from [`GeminiClient::generate`].
    pub async fn try_nearest_supermarket(
        &self,
        location: Coordinate,
        brands: &[String],
    ) -> Result<Option<Landmark>, AgentError> {
        let prompt = build_landmark_prompt(location, brands);
        let generation = self
            .gemini
            .generate(&prompt, GroundingTool::GoogleMaps)
            .await?;

        let landmark = serde_json::from_str::<FoundStore>(&extract_json_object(&generation.text))
            .ok()
            .and_then(FoundStore::into_landmark);
        match &landmark {
            Some(found) => tracing::debug!(name = %found.name, "supermarket located"),
            None => tracing::debug!("no usable supermarket in model output"),
        }
        Ok(landmark)
    }
}

fn build_landmark_prompt(location: Coordinate, brands: &[String]) -> String {
    let brand_list = brands
        .iter()
        .map(|b| format!("\"{b}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Find the closest supermarket belonging to one of these chains: {brand_list}, \
         near latitude {lat}, longitude {lng}.\n\
         \n\
         Answer with one JSON object:\n\
         {{ \"name\": \"store name\", \"lat\": number, \"lng\": number }}\n\
         Use precise coordinates.\n",
        lat = location.lat,
        lng = location.lng,
    )
}
