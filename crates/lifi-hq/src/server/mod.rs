//! HTTP server
//!
//! This module provides the REST API and the WebSocket endpoint of the HQ
//! bridge. No UI is served.

pub mod messages;
pub mod rest;
pub mod websocket;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::AppState;

/// Create the server router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(rest::health))
        // WebSocket endpoint
        .route("/ws", get(websocket::ws_handler))
        // REST endpoints
        .route("/api/nodes", get(rest::list_nodes))
        .route("/api/nodes/:id", get(rest::get_node).put(rest::update_node))
        .route("/api/messages", get(rest::list_messages))
        .route("/api/stats", get(rest::get_stats))
        .route("/api/ports", get(rest::list_ports))
        // CORS for browser clients
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
