//! TCP listener for the native client.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;

use super::session::{BridgeContext, run_session};
use crate::error::{ListenerKind, RelayError};

/// Pause after a failed `accept` before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Bound native bridge listener.
///
/// Every accepted connection runs in its own task; a failure in one
/// session never reaches the listener or other sessions.
#[derive(Debug)]
pub struct BridgeServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    ctx: BridgeContext,
}

impl BridgeServer {
    /// Binds the bridge listener.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Bind`] if the address cannot be acquired.
    pub async fn bind(addr: SocketAddr, ctx: BridgeContext) -> Result<Self, RelayError> {
        let bind_err = |source: std::io::Error| RelayError::Bind {
            listener: ListenerKind::Bridge,
            addr,
            source,
        };
        let listener = TcpListener::bind(addr).await.map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;
        Ok(Self {
            listener,
            local_addr,
            ctx,
        })
    }

    /// Address the listener actually bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts native connections until the future is dropped.
    pub async fn serve(self) {
        tracing::info!(addr = %self.local_addr, "bridge listening");

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    tracing::warn!(error = %err, "bridge accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };

            let ctx = self.ctx.clone();
            tokio::spawn(async move {
                if let Err(err) = run_session(stream, peer, ctx).await {
                    tracing::warn!(%peer, error = %err, "native connection closed with error");
                }
            });
        }
    }
}
