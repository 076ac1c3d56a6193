//! REST API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lifi_core::{MeshStats, MessageView, Node, NodeId, NodeUpdate};
use lifi_link::PortDescriptor;
use lifi_state::{StateError, DEFAULT_MESSAGE_LIMIT};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};

use crate::AppState;

/// Error returned by REST handlers, rendered as `{"error": "..."}`
#[derive(Debug)]
pub enum ApiError {
    /// Requested node does not exist
    NodeNotFound,
    /// The store failed
    Store(StateError),
}

impl From<StateError> for ApiError {
    fn from(err: StateError) -> Self {
        ApiError::Store(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NodeNotFound => (StatusCode::NOT_FOUND, "Node not found".to_string()),
            ApiError::Store(e) => {
                error!(error = %e, code = e.error_code(), "Store error in request");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// List all nodes
pub async fn list_nodes(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Node>>, ApiError> {
    Ok(Json(state.store.get_nodes().await?))
}

/// Get specific node
pub async fn get_node(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Node>, ApiError> {
    state
        .store
        .get_node(&NodeId::from(id))
        .await?
        .map(Json)
        .ok_or(ApiError::NodeNotFound)
}

/// Apply a partial update and return the node
pub async fn update_node(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<NodeUpdate>,
) -> Result<Json<Node>, ApiError> {
    debug!(node = %id, ?update, "Updating node");
    state
        .store
        .update_node(&NodeId::from(id), &update)
        .await?
        .map(Json)
        .ok_or(ApiError::NodeNotFound)
}

/// Query parameters for the message list
#[derive(Debug, Default, Deserialize)]
pub struct MessagesQuery {
    /// Maximum number of messages; missing or unparsable means 50
    #[serde(default, deserialize_with = "lenient_limit")]
    pub limit: Option<usize>,
}

fn lenient_limit<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value.trim().parse() {
        Ok(limit) => Some(limit),
        Err(_) => {
            debug!(limit = %value, "Ignoring invalid message limit");
            None
        }
    }))
}

/// Recent messages, newest first
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<MessageView>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_MESSAGE_LIMIT);
    Ok(Json(state.store.get_messages(limit).await?))
}

/// Mesh statistics
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<MeshStats>, ApiError> {
    Ok(Json(state.store.get_stats().await?))
}

/// Serial ports visible to the server
pub async fn list_ports() -> Json<Vec<PortDescriptor>> {
    Json(lifi_link::list_ports())
}

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}
