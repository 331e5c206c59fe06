//! Native bridge: the TCP endpoint for the upstream client.
//!
//! The native client connects, receives a one-time greeting, and then
//! streams `<event>:<payload>` lines. Each line is parsed and published to
//! the event bus.

pub mod server;
pub mod session;
pub mod stats;

pub use server::BridgeServer;
pub use session::{BridgeContext, run_session};
pub use stats::{BridgeStats, BridgeStatsSnapshot, ConnectionStats};
