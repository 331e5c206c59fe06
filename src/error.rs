//! Relay error types.
//!
//! [`RelayError`] is the central error type for the relay. Only the startup
//! and serve variants ever reach `main`; frame and connection errors are
//! logged and contained by the task that produced them.

use std::net::SocketAddr;

use crate::domain::FrameError;

/// Which of the two listeners an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    /// TCP listener for the native client.
    Bridge,
    /// HTTP/WebSocket listener for web clients.
    PubSub,
}

impl std::fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bridge => f.write_str("bridge"),
            Self::PubSub => f.write_str("pubsub"),
        }
    }
}

/// Relay error enum.
///
/// | Variant          | Scope          | Fatal |
/// |------------------|----------------|-------|
/// | `Bind`           | startup        | yes   |
/// | `Config`         | startup        | yes   |
/// | `Serve`          | process        | yes   |
/// | `MalformedFrame` | single message | no    |
/// | `Connection`     | one connection | no    |
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// A listener could not acquire its address.
    #[error("failed to bind {listener} listener on {addr}: {source}")]
    Bind {
        /// Listener that failed.
        listener: ListenerKind,
        /// Address that was requested.
        addr: SocketAddr,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration value could not be used.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A chunk from the native client could not be parsed into a frame.
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] FrameError),

    /// Read or write failure on a single connection.
    #[error("connection error with {peer}: {source}")]
    Connection {
        /// Remote address of the failed connection.
        peer: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP/WebSocket server loop terminated with an error.
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

impl RelayError {
    /// Returns `true` if this error must terminate the process.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Bind { .. } | Self::Config(_) | Self::Serve(_))
    }
}
