//! Axum WebSocket upgrade handler.

use std::net::SocketAddr;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::domain::RelayEvent;

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
///
/// The new client is subscribed before the greeting is broadcast, so it
/// sees the greeting along with everyone already connected.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let event_rx = state.event_bus.subscribe();
        let receivers = state
            .event_bus
            .publish(RelayEvent::greeting(&*state.greeting));
        tracing::debug!(%peer, receivers, "greeting broadcast");

        run_connection(socket, event_rx, peer, state.log_payloads).await;
    })
}
