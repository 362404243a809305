mod configuration;
mod error;
mod routes;
mod state;

use anyhow::Context;
use axum::Router;
use scout::agent::Agent;
use scout::providers::openai::OpenAiProvider;
use scout::registry::ToolRegistry;
use scout::tools::{PageFetcher, SearchTool};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::configuration::Settings;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up a local .env before reading the environment
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = Settings::new()?;
    let addr = settings
        .server
        .socket_addr()
        .context("Invalid server host or port")?;

    let timeout = settings.search.timeout();
    let search = SearchTool::with_timeout(settings.search.to_config(), timeout)?;
    let fetcher = PageFetcher::with_timeout(timeout)?;
    let registry = ToolRegistry::standard(search, fetcher)?;
    let provider = OpenAiProvider::new(settings.provider.into_config())?;
    let agent = Agent::new(
        Box::new(provider),
        Arc::new(registry),
        settings.agent.into_config(),
    );

    let app = app(AppState::new(agent), &settings.server.static_dir);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

/// API routes, with static assets for everything else
fn app(state: AppState, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::configure(state)
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
}
