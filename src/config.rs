//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::RelayError;

/// Default greeting sent to native clients and broadcast to web clients.
pub const DEFAULT_GREETING: &str = "Hello from Express Backend";

/// Largest accepted `EVENT_BUS_CAPACITY`. The broadcast ring preallocates
/// one slot per entry.
pub const MAX_EVENT_BUS_CAPACITY: usize = 1 << 20;

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-field lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address of the TCP listener for the native client.
    pub bridge_addr: SocketAddr,

    /// Address of the HTTP/WebSocket listener for web clients.
    pub pubsub_addr: SocketAddr,

    /// Text sent once per new connection on both listeners.
    pub greeting: String,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// Longest accepted bridge line, in bytes, before it is discarded.
    pub max_frame_bytes: usize,

    /// Whether payload text is included in log lines.
    pub log_payloads: bool,

    /// Tracing output format.
    pub log_format: LogFormat,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bridge_addr: SocketAddr::from(([127, 0, 0, 1], 3002)),
            pubsub_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            greeting: DEFAULT_GREETING.to_string(),
            event_bus_capacity: 1024,
            max_frame_bytes: 64 * 1024,
            log_payloads: false,
            log_format: LogFormat::Pretty,
        }
    }
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`] if `BRIDGE_ADDR` or `PUBSUB_ADDR` is
    /// set but cannot be parsed as a [`SocketAddr`], or if
    /// `EVENT_BUS_CAPACITY` is out of range.
    pub fn from_env() -> Result<Self, RelayError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Falls back to [`RelayConfig::default`] for unset keys and for
    /// numeric or boolean values that do not parse.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`] if an address key is set but
    /// unparsable, or if `EVENT_BUS_CAPACITY` is outside
    /// `1..=`[`MAX_EVENT_BUS_CAPACITY`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bridge_addr = parse_addr(&lookup, "BRIDGE_ADDR", defaults.bridge_addr)?;
        let pubsub_addr = parse_addr(&lookup, "PUBSUB_ADDR", defaults.pubsub_addr)?;
        let greeting = lookup("GREETING").unwrap_or(defaults.greeting);
        let event_bus_capacity =
            parse_or(&lookup, "EVENT_BUS_CAPACITY", defaults.event_bus_capacity);
        if !(1..=MAX_EVENT_BUS_CAPACITY).contains(&event_bus_capacity) {
            return Err(RelayError::Config(format!(
                "EVENT_BUS_CAPACITY={event_bus_capacity}: must be between 1 and {MAX_EVENT_BUS_CAPACITY}"
            )));
        }
        let max_frame_bytes = parse_or(&lookup, "MAX_FRAME_BYTES", defaults.max_frame_bytes);
        let log_payloads = parse_bool(&lookup, "LOG_PAYLOADS", defaults.log_payloads);
        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            bridge_addr,
            pubsub_addr,
            greeting,
            event_bus_capacity,
            max_frame_bytes,
            log_payloads,
            log_format,
        })
    }
}

fn parse_addr<F>(lookup: &F, key: &str, default: SocketAddr) -> Result<SocketAddr, RelayError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| RelayError::Config(format!("{key}={raw}: {e}"))),
        None => Ok(default),
    }
}

/// Parses a value as `T`, returning `default` on missing or invalid values.
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses a boolean. Accepts `"true"`, `"1"`, `"false"`, `"0"`
/// (case-insensitive). Returns `default` otherwise.
fn parse_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.to_ascii_lowercase()).as_deref() {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}
