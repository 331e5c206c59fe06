//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single web client, forwarding
//! filtered bus events and logging inbound chatter.

use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::domain::{ConnectionId, GENERIC_CHANNEL, RelayEvent};

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads client messages: commands adjust the subscription filter,
///   events on the generic channel are logged.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<RelayEvent>,
    peer: SocketAddr,
    log_payloads: bool,
) {
    let conn_id = ConnectionId::new();
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    tracing::info!(%conn_id, %peer, "web client connected");

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs, conn_id, log_payloads);
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(%conn_id, error = %err, "ws read failed");
                        break;
                    }
                    _ => {}
                }
            }
            // Event from EventBus
            event = event_rx.recv() => {
                match event {
                    Ok(relay_event) => {
                        if subs.matches(&relay_event.event) {
                            let msg = WsMessage::from_event(&relay_event);
                            let Ok(json) = serde_json::to_string(&msg) else {
                                continue;
                            };
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(%conn_id, lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::info!(%conn_id, %peer, "web client disconnected");
}

/// Handles a text message from the client, returning an optional JSON response.
fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    conn_id: ConnectionId,
    log_payloads: bool,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        tracing::debug!(%conn_id, bytes = text.len(), "malformed ws message");
        let err = WsMessage::error(String::new(), 400, "malformed JSON");
        return serde_json::to_string(&err).ok();
    };

    match msg.msg_type {
        WsMessageType::Event => {
            let event = msg.event.as_deref().unwrap_or(GENERIC_CHANNEL);
            if event == GENERIC_CHANNEL {
                let shown = log_payloads.then_some(&msg.payload);
                tracing::info!(%conn_id, payload = ?shown, "message from web client");
            } else {
                tracing::debug!(%conn_id, event, "ignoring client event");
            }
            None
        }
        WsMessageType::Command => {
            let response = match serde_json::from_value::<WsCommand>(msg.payload) {
                Ok(WsCommand::Subscribe { events }) => {
                    subs.subscribe(&events);
                    WsMessage::response(
                        msg.id,
                        serde_json::json!({
                            "subscribed": events,
                            "count": subs.count(),
                            "wildcard": subs.is_subscribed_all(),
                        }),
                    )
                }
                Ok(WsCommand::Unsubscribe { events }) => {
                    subs.unsubscribe(&events);
                    WsMessage::response(
                        msg.id,
                        serde_json::json!({
                            "unsubscribed": events,
                            "remaining_count": subs.count(),
                            "wildcard": subs.is_subscribed_all(),
                        }),
                    )
                }
                Err(_) => WsMessage::error(msg.id, 404, "unknown command"),
            };
            serde_json::to_string(&response).ok()
        }
        WsMessageType::Response | WsMessageType::Error => {
            let err = WsMessage::error(msg.id, 400, "unexpected message type");
            serde_json::to_string(&err).ok()
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn respond(text: &str, subs: &mut SubscriptionManager) -> Option<serde_json::Value> {
        handle_text_message(text, subs, ConnectionId::new(), false)
            .and_then(|json| serde_json::from_str(&json).ok())
    }

    #[test]
    fn malformed_json_gets_error() {
        let mut subs = SubscriptionManager::new();
        let Some(resp) = respond("not json", &mut subs) else {
            panic!("expected error response");
        };
        assert_eq!(resp["type"], "error");
        assert_eq!(resp["payload"]["code"], 400);
    }

    #[test]
    fn generic_channel_message_is_only_logged() {
        let mut subs = SubscriptionManager::new();
        let resp = respond(
            r#"{"type":"event","event":"message","payload":"hello"}"#,
            &mut subs,
        );
        assert!(resp.is_none());
        assert!(subs.is_subscribed_all());
    }

    #[test]
    fn subscribe_command_narrows_filter() {
        let mut subs = SubscriptionManager::new();
        let Some(resp) = respond(
            r#"{"id":"c1","type":"command","payload":{"command":"subscribe","events":["scoreUpdate"]}}"#,
            &mut subs,
        ) else {
            panic!("expected response");
        };
        assert_eq!(resp["id"], "c1");
        assert_eq!(resp["type"], "response");
        assert_eq!(resp["payload"]["count"], 1);
        assert!(subs.matches("scoreUpdate"));
        assert!(!subs.matches("alert"));
    }

    #[test]
    fn unsubscribe_command_reports_remaining() {
        let mut subs = SubscriptionManager::new();
        subs.subscribe(&["a", "b"]);
        let Some(resp) = respond(
            r#"{"id":"c2","type":"command","payload":{"command":"unsubscribe","events":["a"]}}"#,
            &mut subs,
        ) else {
            panic!("expected response");
        };
        assert_eq!(resp["payload"]["remaining_count"], 1);
        assert!(!subs.matches("a"));
    }

    #[test]
    fn unknown_command_gets_error() {
        let mut subs = SubscriptionManager::new();
        let Some(resp) = respond(
            r#"{"id":"c3","type":"command","payload":{"command":"swap"}}"#,
            &mut subs,
        ) else {
            panic!("expected error response");
        };
        assert_eq!(resp["type"], "error");
        assert_eq!(resp["payload"]["code"], 404);
    }
}
