//! HTTP layer: route composition for the pub/sub listener.

pub mod system;

use axum::Router;
use axum::routing::get;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Builds the complete router: WebSocket endpoint plus system routes.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws_handler))
        .merge(system::routes())
}
