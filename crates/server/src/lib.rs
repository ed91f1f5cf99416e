//! HTTP surface over an [`Orchestrator`].
//!
//! | Route              | Purpose                              |
//! |--------------------|--------------------------------------|
//! | `GET /api/health`  | liveness and uptime                  |
//! | `GET /api/agents`  | roster with capabilities             |
//! | `GET /api/analyze` | plan and run `?q=`, return the trace |
//! | `GET /api/plan`    | plan `?q=` without running it        |

use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use orchestra_planner::Orchestrator;

pub mod api;
pub mod config;
pub mod error;

pub use config::ServerConfig;
pub use error::{ApiError, Result, ServerError};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            started_at: Utc::now(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(api::health))
        .route("/api/agents", get(api::list_agents))
        .route("/api/analyze", get(api::analyze))
        .route("/api/plan", get(api::preview_plan))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(config: ServerConfig, state: AppState) -> Result<()> {
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    info!(%addr, agents = state.orchestrator.roster().len(), "Orchestra API listening");

    axum::serve(listener, router(state)).await?;
    Ok(())
}
