use crate::config::ServerConfig;
use crate::router::{Router, RouterCommand};
use crate::signaling::{SignalingService, ws_handler};
use anyhow::{Context, Result};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Spawns the router actor and returns the service the HTTP layer shares.
pub fn spawn_signaling(config: &ServerConfig) -> SignalingService {
    let (router_tx, router_rx) = mpsc::channel::<RouterCommand>(config.router_queue);
    let service = SignalingService::new(router_tx, config.ice_servers.clone());

    let router = Router::new(router_rx, Arc::new(service.clone()));
    tokio::spawn(router.run());

    service
}

/// `/ws` for signaling, `/health` for a liveness probe with counters.
pub fn build_app(service: SignalingService) -> axum::Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    axum::Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

pub async fn serve(config: ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    serve_on(listener, config).await
}

/// Like [`serve`] but on an already bound listener (port 0 in tests).
pub async fn serve_on(listener: TcpListener, config: ServerConfig) -> Result<()> {
    let service = spawn_signaling(&config);
    let app = build_app(service);

    info!("Signaling server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await.context("Signaling server crashed")?;
    Ok(())
}

async fn health_handler(State(service): State<SignalingService>) -> impl IntoResponse {
    match service.stats().await {
        Some(stats) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "connections": stats.connections,
                "rooms": stats.rooms,
            })),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "router unavailable" })),
        ),
    }
}
