//! Frame parsing for the native bridge protocol.
//!
//! A frame is one line of UTF-8 text shaped `<event>:<payload>`. Only the
//! first colon delimits; everything after it belongs to the payload, which
//! is trimmed of Unicode whitespace and U+FEFF (the same set as JavaScript's
//! `String.prototype.trim`). The event name is taken verbatim.

use std::str::FromStr;

/// Delimiter between event name and payload.
pub const FRAME_DELIMITER: char = ':';

/// Reasons a chunk of bridge input does not form a [`Frame`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The chunk contains no `:` delimiter.
    #[error("no ':' delimiter found")]
    MissingDelimiter,

    /// The chunk is not valid UTF-8.
    #[error("invalid utf-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// The line exceeded the configured maximum length and was discarded.
    ///
    /// Raised by the bridge's line reader before parsing; [`parse`] itself
    /// has no length limit.
    #[error("frame exceeds {limit} bytes")]
    TooLong {
        /// Configured limit in bytes.
        limit: usize,
    },
}

/// A single `(event, payload)` unit relayed from the native client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Event name, used verbatim as the broadcast channel.
    pub event: String,
    /// Trimmed message body.
    pub payload: String,
}

impl Frame {
    /// Creates a frame from its parts.
    #[must_use]
    pub fn new(event: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            payload: payload.into(),
        }
    }
}

impl FromStr for Frame {
    type Err = FrameError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (event, rest) = text
            .split_once(FRAME_DELIMITER)
            .ok_or(FrameError::MissingDelimiter)?;
        Ok(Self::new(event, trim_payload(rest)))
    }
}

/// Trims Unicode whitespace and byte-order marks from both ends.
fn trim_payload(raw: &str) -> &str {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
}

/// Parses raw bridge bytes into a [`Frame`].
///
/// # Errors
///
/// Returns [`FrameError::InvalidUtf8`] if `raw` is not UTF-8 and
/// [`FrameError::MissingDelimiter`] if it contains no colon.
pub fn parse(raw: &[u8]) -> Result<Frame, FrameError> {
    std::str::from_utf8(raw)?.parse()
}
