//! API Server Module
//!
//! Application state, router assembly and server startup.

use axum::{middleware::from_fn, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use super::middleware::request_logging_middleware;
use super::routes;
use crate::client::{PluggyClient, SharedTransport};
use crate::common::config::GatewayConfig;
use crate::common::logging::log_system_event;

/// Application state shared by every handler
///
/// Holds configuration and the pooled transport only. Credentials live in
/// the request-scoped [`PluggyClient`] built by [`AppState::client`].
pub struct AppState {
    pub config: GatewayConfig,
    pub transport: SharedTransport,
}

/// Shared application state type
pub type SharedAppState = Arc<AppState>;

impl AppState {
    pub fn new(config: GatewayConfig, transport: SharedTransport) -> SharedAppState {
        Arc::new(Self { config, transport })
    }

    /// Fresh client with an empty credential cache
    pub fn client(&self) -> PluggyClient {
        PluggyClient::from_config(&self.config, self.transport.clone())
    }
}

pub fn create_router(state: SharedAppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::health::routes())
        .merge(routes::accounts::routes())
        .merge(routes::items::routes())
        .merge(routes::transactions::routes())
        .merge(routes::pix::routes())
        .merge(routes::enrich::routes())
        .merge(routes::sandbox::routes())
        .merge(routes::debug::routes())
        .layer(from_fn(request_logging_middleware))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server(state: SharedAppState, port: u16) -> Result<(), std::io::Error> {
    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    println!("=== Pluggy Gateway ===");
    println!("Listening on http://{}", addr);
    println!();
    println!("Endpoints:");
    println!("  GET  /                                  - Health check");
    println!("  GET  /accounts/:itemId                  - Accounts of an item");
    println!("  GET  /items                             - List items");
    println!("  GET  /transactions/:accountId           - List transactions");
    println!("  POST /pix/transfer                      - Create PIX payment");
    println!("  POST /enrich                            - Enrich transactions");
    println!("  POST /sandbox/items                     - Create sandbox item");
    println!("  GET  /sandbox/items/:itemId             - Get item");
    println!("  GET  /sandbox/items/:itemId/wait        - Wait for item");
    println!("  GET  /debug/env                         - Upstream settings");
    println!("  GET  /debug/auth                        - Test credential exchange");
    println!();

    log_system_event("server_started", serde_json::json!({ "port": port }));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
