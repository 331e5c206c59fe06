//! # viewer-relay
//!
//! Relays `<event>:<payload>` lines from one native TCP client to any
//! number of web clients connected over WebSocket.
//!
//! ## Architecture
//!
//! ```text
//! Native client (TCP, newline-delimited)
//!     │
//!     ├── BridgeServer / session (bridge/)
//!     ├── Frame parser (domain/)
//!     │
//!     ├── EventBus (domain/)
//!     │
//!     ├── WS Handler + subscriptions (ws/)
//!     │
//!     └── Web clients (WebSocket, JSON envelopes)
//! ```
//!
//! Both listeners are bound by [`app::Relay`] from a [`config::RelayConfig`].

pub mod api;
pub mod app;
pub mod app_state;
pub mod bridge;
pub mod config;
pub mod domain;
pub mod error;
pub mod ws;
