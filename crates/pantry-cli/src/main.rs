mod commands;

use clap::{Parser, Subcommand};
use pantry_core::{load_catalog, Catalog, Coordinate, Ingredient, Landmark};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pantry-cli")]
#[command(about = "Plan meal-ingredient sourcing from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build a sourcing plan for a shopping list around a location
    Plan {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Required item as NAME:QTY:UNIT (repeatable)
        #[arg(long = "ingredient", required = true, value_parser = parse_ingredient)]
        ingredients: Vec<Ingredient>,
        /// Seed for a reproducible pool and timings
        #[arg(long)]
        seed: Option<u64>,
        /// Real store to place the fallback supplier at, as NAME@LAT,LNG
        #[arg(long, value_parser = parse_landmark)]
        landmark: Option<Landmark>,
    },
    /// Show the generated supplier pool around a location
    Suppliers {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Ask Gemini for a recipe and shopping list
    Recipe {
        #[arg(long)]
        meal: String,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        headcount: u32,
        /// Request a different take on the same dish
        #[arg(long)]
        variation: bool,
    },
}

/// Parse `NAME:QTY:UNIT`. The name may itself contain colons.
fn parse_ingredient(raw: &str) -> Result<Ingredient, String> {
    let mut parts = raw.rsplitn(3, ':');
    let (Some(unit), Some(qty), Some(name)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected NAME:QTY:UNIT, got {raw:?}"));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err("ingredient name must not be empty".to_string());
    }
    let quantity: f64 = qty
        .trim()
        .parse()
        .map_err(|e| format!("invalid quantity {qty:?}: {e}"))?;
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(format!("quantity must be a non-negative number, got {qty}"));
    }
    Ok(Ingredient::new(name, quantity, unit.trim()))
}

/// Parse `NAME@LAT,LNG`.
fn parse_landmark(raw: &str) -> Result<Landmark, String> {
    let (name, coords) = raw
        .rsplit_once('@')
        .ok_or_else(|| format!("expected NAME@LAT,LNG, got {raw:?}"))?;
    let (lat, lng) = coords
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG after '@', got {coords:?}"))?;
    let parse = |label: &str, value: &str| {
        value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("invalid {label} {value:?}"))
    };
    let name = name.trim();
    if name.is_empty() {
        return Err("landmark name must not be empty".to_string());
    }
    Ok(Landmark {
        name: name.to_string(),
        location: Coordinate::new(parse("latitude", lat)?, parse("longitude", lng)?),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    let config = pantry_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    // stdout carries the JSON result.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let catalog = match config.catalog_path.as_deref() {
        Some(path) => load_catalog(path)?,
        None => Catalog::default(),
    };

    match cli.command {
        Commands::Plan {
            lat,
            lng,
            ingredients,
            seed,
            landmark,
        } => commands::run_plan(
            &config,
            catalog,
            Coordinate::new(lat, lng),
            &ingredients,
            seed,
            landmark.as_ref(),
        ),
        Commands::Suppliers { lat, lng, seed } => {
            commands::run_suppliers(&config, catalog, Coordinate::new(lat, lng), seed)
        }
        Commands::Recipe {
            meal,
            headcount,
            variation,
        } => commands::run_recipe(&config, &catalog, &meal, headcount, variation).await,
    }
}
