//! Integration tests for the HQ server
//!
//! Handlers are called directly with a shared `AppState` backed by the
//! in-memory store; device traffic goes through a simulated device.

mod rest_handlers;
mod websocket_handlers;

use axum::body::to_bytes;
use axum::response::{IntoResponse, Response};
use lifi_hq::AppState;
use lifi_link::LinkConfig;
use lifi_state::{MemoryStore, MeshStore};
use std::sync::Arc;
use std::time::Duration;

pub fn test_state() -> Arc<AppState> {
    test_state_with_store(Arc::new(MemoryStore::new()))
}

pub fn test_state_with_store(store: Arc<dyn MeshStore>) -> Arc<AppState> {
    let config = LinkConfig::builder()
        .settle_delay(Duration::ZERO)
        .join_timeout(Duration::from_millis(500))
        .build();
    Arc::new(AppState::new(store, config))
}

/// Status code and JSON body of a handler result
pub async fn json_response(response: impl IntoResponse) -> (u16, serde_json::Value) {
    let response: Response = response.into_response();
    let status = response.status().as_u16();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}
