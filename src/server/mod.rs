//! Axum server setup and router construction.

pub mod api;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use log::{error, info};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};

use crate::ai::Analyzer;
use api::AppState;

pub use api::{AnalysisData, AnalysisRequest, Envelope};

/// Build the router serving `/api/analysis` and `/api/health`.
pub fn build_router(analyzer: Analyzer) -> Router {
    let state = AppState { analyzer };

    // Browser front ends are served from a different origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/analysis", post(api::post_analysis))
        .route("/api/health", get(api::get_health))
        .with_state(state)
        .layer(cors)
}

/// Start the server in the background and return the bound address.
pub async fn start_server(router: Router, bind_addr: SocketAddr) -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!("Server stopped: {e}");
        }
    });

    Ok(addr)
}

/// Serve in the foreground until Ctrl-C.
pub async fn run_server(router: Router, bind_addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {e}");
            }
        })
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}
