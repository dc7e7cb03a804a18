// HTTP and WebSocket APIs

pub mod query;
pub mod websocket;

pub use query::{create_query_router, QueryAppState};
pub use websocket::{create_ws_router, ws_handler, WsAppState};

use crate::engine::EngineHandle;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Full HTTP surface: WebSocket stream plus state queries
pub fn create_router(engine: EngineHandle) -> Router {
    let ws_state = Arc::new(WsAppState {
        engine: engine.clone(),
    });
    let query_state = Arc::new(QueryAppState { engine });

    Router::new()
        .merge(create_ws_router(ws_state))
        .merge(create_query_router(query_state))
        .layer(CorsLayer::permissive())
}
