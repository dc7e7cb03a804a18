use crate::device::EntityKey;
use crate::engine::{DashboardView, DeviceView, EngineHandle};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state for query API
pub struct QueryAppState {
    pub engine: EngineHandle,
}

/// Query parameters for the state view
#[derive(Deserialize)]
pub struct StateQueryParams {
    /// Keep only devices whose updating flag matches
    pub updating: Option<bool>,
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create query API router
pub fn create_query_router(state: Arc<QueryAppState>) -> Router {
    Router::new()
        .route("/api/state", get(get_state))
        .route("/api/state/devices/:key", get(get_device))
        .with_state(state)
}

/// GET /api/state - Latest dashboard view
///
/// Query parameters:
/// - `updating`: only devices currently (or not) inside a highlight window
async fn get_state(
    State(state): State<Arc<QueryAppState>>,
    Query(params): Query<StateQueryParams>,
) -> Json<DashboardView> {
    let mut view = state.engine.latest_view();

    if let Some(updating) = params.updating {
        view.devices.retain(|d| d.updating == updating);
    }

    Json(view)
}

/// GET /api/state/devices/:key - One device by identity key
async fn get_device(
    State(state): State<Arc<QueryAppState>>,
    Path(key): Path<u64>,
) -> Result<Json<DeviceView>, QueryError> {
    let view = state.engine.latest_view();
    let device = view
        .device(EntityKey::new(key))
        .cloned()
        .ok_or(QueryError::NotFound)?;

    Ok(Json(device))
}

/// Query error types
#[derive(Debug)]
enum QueryError {
    NotFound,
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            QueryError::NotFound => (StatusCode::NOT_FOUND, "Device not found"),
        };

        let body = Json(ErrorResponse {
            error: error_message.to_string(),
        });

        (status, body).into_response()
    }
}
