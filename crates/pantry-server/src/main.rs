mod api;
mod middleware;
mod session;

use std::sync::Arc;

use pantry_agent::{AgentError, GeminiClient, LandmarkLocator, RecipeAnalyst, RouteClient};
use pantry_core::{load_catalog, Catalog};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::ManagerAuth,
    session::Session,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = pantry_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let catalog = match config.catalog_path.as_deref() {
        Some(path) => load_catalog(path)?,
        None => Catalog::default(),
    };
    let session = Arc::new(Session::from_config(&config, catalog));

    let gemini = match GeminiClient::from_app_config(&config) {
        Ok(client) => Some(client),
        Err(AgentError::NotConfigured(var)) => {
            tracing::warn!("{var} not set; recipe analysis and landmark lookup disabled");
            None
        }
        Err(e) => return Err(e.into()),
    };
    let state = AppState {
        session,
        analyst: gemini.clone().map(RecipeAnalyst::new),
        locator: gemini.map(LandmarkLocator::new),
        routes: RouteClient::from_app_config(&config)?,
    };

    let auth = ManagerAuth::from_config(&config)?;
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "pantry server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
