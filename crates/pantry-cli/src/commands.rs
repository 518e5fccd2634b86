//! Subcommand handlers. Each prints its result to stdout as pretty JSON.

use anyhow::Context;
use pantry_agent::{GeminiClient, RecipeAnalyst};
use pantry_core::{total_travel_minutes, AppConfig, Catalog, Coordinate, Ingredient, Landmark};
use pantry_sourcing::{inventory_reports, PoolSettings, SourcingPlanner, SupplierPool};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

/// The flag wins over `PANTRY_RNG_SEED`; neither means OS entropy.
fn session_rng(config: &AppConfig, seed: Option<u64>) -> StdRng {
    match seed.or(config.rng_seed) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}

pub(crate) fn run_plan(
    config: &AppConfig,
    catalog: Catalog,
    location: Coordinate,
    ingredients: &[Ingredient],
    seed: Option<u64>,
    landmark: Option<&Landmark>,
) -> anyhow::Result<()> {
    let mut rng = session_rng(config, seed);
    let planner = SourcingPlanner::new(catalog.virtual_hub_name.clone());
    let pool = SupplierPool::new(catalog, PoolSettings::from_app_config(config));

    let suppliers = pool.generate_suppliers(&mut rng, location);
    let shipments =
        planner.create_sourcing_plan(&mut rng, location, ingredients, &suppliers, landmark);
    let delivery_minutes = total_travel_minutes(&shipments);

    print_json(&json!({
        "shipments": shipments,
        "delivery_minutes": delivery_minutes,
    }))
}

pub(crate) fn run_suppliers(
    config: &AppConfig,
    catalog: Catalog,
    center: Coordinate,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let mut rng = session_rng(config, seed);
    let pool = SupplierPool::new(catalog, PoolSettings::from_app_config(config));
    let suppliers = pool.generate_suppliers(&mut rng, center);
    print_json(&inventory_reports(&suppliers, Some(center)))
}

pub(crate) async fn run_recipe(
    config: &AppConfig,
    catalog: &Catalog,
    meal: &str,
    headcount: u32,
    variation: bool,
) -> anyhow::Result<()> {
    let gemini = GeminiClient::from_app_config(config)?;
    let analyst = RecipeAnalyst::new(gemini);
    let recipe = analyst
        .try_analyze(meal, headcount, &catalog.inventory_keys(), variation)
        .await?
        .with_context(|| format!("no usable recipe for {meal:?}; try rephrasing the meal"))?;
    print_json(&recipe)
}
