//! Turning a meal description into a priced-by-retail-unit shopping list.

use pantry_core::{Ingredient, RecipeAnalysis};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;

use crate::error::AgentError;
use crate::gemini::{GeminiClient, GroundingTool};
use crate::json::extract_json_object;

/// Model output before URL policy is applied. Every field is optional so a
/// partially filled answer still yields a usable list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecipe {
    #[serde(default)]
    recipe_name: String,
    #[serde(default)]
    instructions: String,
    #[serde(default)]
    ingredients: Vec<RawIngredient>,
}

#[derive(Debug, Deserialize)]
struct RawIngredient {
    name: String,
    #[serde(default)]
    quantity: f64,
    #[serde(default)]
    unit: String,
}

/// Resolves recipes through a search-grounded model.
#[derive(Debug, Clone)]
pub struct RecipeAnalyst {
    gemini: GeminiClient,
}

impl RecipeAnalyst {
    #[must_use]
    pub fn new(gemini: GeminiClient) -> Self {
        Self { gemini }
    }

    /// Like [`RecipeAnalyst::try_analyze`] but folds every failure into
    /// `None`, logging the cause.
    pub async fn analyze(
        &self,
        meal: &str,
        headcount: u32,
        inventory_keys: &[String],
        is_variation: bool,
    ) -> Option<RecipeAnalysis> {
        match self
            .try_analyze(meal, headcount, inventory_keys, is_variation)
            .await
        {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!(error = %e, meal, "recipe analysis failed");
                None
            }
        }
    }

    /// Ask the model for a recipe and shopping list for `headcount` people.
    ///
    /// Returns `Ok(None)` when the model answered with nothing usable.
    ///
    /// # Errors
    ///
    /// Returns the transport error from [`GeminiClient::generate`].
    pub async fn try_analyze(
        &self,
        meal: &str,
        headcount: u32,
        inventory_keys: &[String],
        is_variation: bool,
    ) -> Result<Option<RecipeAnalysis>, AgentError> {
        let prompt = build_recipe_prompt(meal, headcount, inventory_keys, is_variation);
        let generation = self
            .gemini
            .generate(&prompt, GroundingTool::GoogleSearch)
            .await?;

        if generation.text.trim().is_empty() {
            tracing::warn!(meal, "model returned no text");
            return Ok(None);
        }

        let candidate = extract_json_object(&generation.text);
        let raw: RawRecipe = match serde_json::from_str(&candidate) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, meal, "model output is not a recipe object");
                return Ok(None);
            }
        };

        let ingredients = raw
            .ingredients
            .into_iter()
            .filter(|i| !i.name.trim().is_empty() && i.quantity.is_finite() && i.quantity >= 0.0)
            .map(|i| Ingredient::new(i.name.trim(), i.quantity, i.unit))
            .collect();

        let recipe_url = resolve_recipe_url(&generation.grounding_uris, &raw.recipe_name);
        Ok(Some(RecipeAnalysis {
            recipe_name: raw.recipe_name,
            recipe_url,
            instructions: raw.instructions,
            ingredients,
        }))
    }
}

/// First grounded web source, or a search link for the recipe name.
///
/// The model's own URL is never trusted; only grounding metadata counts.
pub(crate) fn resolve_recipe_url(grounding_uris: &[String], recipe_name: &str) -> String {
    grounding_uris
        .iter()
        .find(|uri| uri.starts_with("http"))
        .cloned()
        .unwrap_or_else(|| {
            let query = format!("{recipe_name} recipe");
            format!(
                "https://www.google.com/search?q={}",
                utf8_percent_encode(&query, NON_ALPHANUMERIC)
            )
        })
}

pub(crate) fn build_recipe_prompt(
    meal: &str,
    headcount: u32,
    inventory_keys: &[String],
    is_variation: bool,
) -> String {
    let variation = if is_variation {
        "Pick a DIFFERENT or less common variation of this dish than the obvious one.\n"
    } else {
        ""
    };
    format!(
        "You are a chef planning a grocery run.\n\
         \n\
         Find a real, published recipe for \"{meal}\" that serves {headcount} people.\n\
         {variation}\
         \n\
         Answer with one JSON object shaped like this:\n\
         {{\n  \
           \"recipeName\": \"name of the recipe you found\",\n  \
           \"recipeUrl\": \"\",\n  \
           \"instructions\": \"cooking summary in at most two sentences\",\n  \
           \"ingredients\": [{{ \"name\": \"Ingredient\", \"quantity\": 1, \"unit\": \"unit\" }}]\n\
         }}\n\
         \n\
         Rules:\n\
         1. Leave \"recipeUrl\" empty unless it comes straight from the search results.\n\
         2. Name ingredients after this store list whenever one fits: {keys}.\n\
         3. This is a SHOPPING list. Convert cooking measures (cloves, cups, spoons, pinches) \
         into whole retail units and always round up, e.g. 3 cloves garlic becomes \
         {{ \"name\": \"Garlic\", \"quantity\": 1, \"unit\": \"unit\" }} and 2 tbsp soy sauce \
         becomes {{ \"name\": \"Soy Sauce\", \"quantity\": 1, \"unit\": \"bottle\" }}.\n\
         4. Output the JSON object only, with no Markdown.\n",
        keys = inventory_keys.join(", "),
    )
}
