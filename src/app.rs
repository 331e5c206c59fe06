//! Relay lifecycle: binds both listeners and runs them together.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::bridge::{BridgeContext, BridgeServer, BridgeStats};
use crate::config::RelayConfig;
use crate::domain::EventBus;
use crate::error::{ListenerKind, RelayError};

/// A relay with both listeners bound and ready to serve.
///
/// Binding happens in [`Relay::bind`] so that address conflicts surface
/// before anything is served.
#[derive(Debug)]
pub struct Relay {
    bridge: BridgeServer,
    pubsub_listener: TcpListener,
    pubsub_addr: SocketAddr,
    state: AppState,
}

impl Relay {
    /// Builds the shared bus and binds the bridge and pub/sub listeners.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Bind`] if either address cannot be acquired.
    pub async fn bind(config: &RelayConfig) -> Result<Self, RelayError> {
        let event_bus = EventBus::new(config.event_bus_capacity);
        let greeting: Arc<str> = Arc::from(config.greeting.as_str());
        let bridge_stats = Arc::new(BridgeStats::new());

        let bridge = BridgeServer::bind(
            config.bridge_addr,
            BridgeContext {
                event_bus: event_bus.clone(),
                greeting: Arc::clone(&greeting),
                max_frame_bytes: config.max_frame_bytes,
                log_payloads: config.log_payloads,
                stats: Arc::clone(&bridge_stats),
            },
        )
        .await?;

        let pubsub_err = |source: std::io::Error| RelayError::Bind {
            listener: ListenerKind::PubSub,
            addr: config.pubsub_addr,
            source,
        };
        let pubsub_listener = TcpListener::bind(config.pubsub_addr)
            .await
            .map_err(pubsub_err)?;
        let pubsub_addr = pubsub_listener.local_addr().map_err(pubsub_err)?;

        Ok(Self {
            bridge,
            pubsub_listener,
            pubsub_addr,
            state: AppState {
                event_bus,
                greeting,
                log_payloads: config.log_payloads,
                bridge_stats,
            },
        })
    }

    /// Address of the native bridge listener.
    #[must_use]
    pub const fn bridge_addr(&self) -> SocketAddr {
        self.bridge.local_addr()
    }

    /// Address of the HTTP/WebSocket listener.
    #[must_use]
    pub const fn pubsub_addr(&self) -> SocketAddr {
        self.pubsub_addr
    }

    /// Shared state, for callers that want to publish or inspect counters.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Serves both listeners until `shutdown` resolves.
    ///
    /// On shutdown the HTTP server drains open requests and the bridge
    /// stops accepting; native sessions already running finish on their own.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Serve`] if the HTTP server fails.
    pub async fn run<F>(self, shutdown: F) -> Result<(), RelayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = api::build_router()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(self.state);

        tracing::info!(addr = %self.pubsub_addr, "pubsub listening");

        let server = axum::serve(
            self.pubsub_listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .into_future();

        tokio::select! {
            result = server => result.map_err(RelayError::Serve),
            () = self.bridge.serve() => Ok(()),
        }
    }
}
