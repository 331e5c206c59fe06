//! Native client session.
//!
//! Handles one accepted bridge connection: sends the greeting, closes the
//! write side, then reads newline-delimited frames and publishes each one
//! to the [`EventBus`] in arrival order.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use super::stats::{BridgeStats, ConnectionStats};
use crate::domain::{ConnectionId, EventBus, FrameError, RelayEvent, frame};
use crate::error::RelayError;

/// Everything a bridge session needs, cloned into each connection task.
#[derive(Debug, Clone)]
pub struct BridgeContext {
    /// Bus that parsed frames are published to.
    pub event_bus: EventBus,
    /// Text written to every native client on accept.
    pub greeting: Arc<str>,
    /// Longest accepted line in bytes, excluding the terminator.
    pub max_frame_bytes: usize,
    /// Whether payload text is included in log lines.
    pub log_payloads: bool,
    /// Process-wide counters.
    pub stats: Arc<BridgeStats>,
}

/// Outcome of reading one line from the native client.
#[derive(Debug, PartialEq, Eq)]
enum LineRead {
    /// A line is in the buffer. `bytes` counts everything consumed.
    Line { bytes: usize },
    /// The line exceeded the limit and was discarded.
    TooLong { bytes: usize },
    /// The peer closed its write side.
    Eof,
}

/// Runs a native client session to completion.
///
/// Malformed frames are logged and dropped; the session keeps reading.
///
/// # Errors
///
/// Returns [`RelayError::Connection`] if writing the greeting or reading
/// from the peer fails. The caller logs it; nothing else is affected.
pub async fn run_session<S>(
    stream: S,
    peer: SocketAddr,
    ctx: BridgeContext,
) -> Result<ConnectionStats, RelayError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let conn_id = ConnectionId::new();
    let _active = ctx.stats.track_connection();
    let mut stats = ConnectionStats::default();
    let conn_err = |source: std::io::Error| RelayError::Connection { peer, source };

    tracing::info!(%conn_id, %peer, "native client connected");

    let (reader, mut writer) = tokio::io::split(stream);

    writer
        .write_all(ctx.greeting.as_bytes())
        .await
        .map_err(conn_err)?;
    writer.shutdown().await.map_err(conn_err)?;
    stats.bytes_written = byte_count(ctx.greeting.len());
    tracing::debug!(%conn_id, bytes = stats.bytes_written, "greeting sent, write side closed");

    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        match read_line(&mut reader, &mut line, ctx.max_frame_bytes)
            .await
            .map_err(conn_err)?
        {
            LineRead::Eof => break,
            LineRead::TooLong { bytes } => {
                stats.bytes_read += byte_count(bytes);
                stats.frames_dropped += 1;
                ctx.stats.record_dropped();
                let err = RelayError::from(FrameError::TooLong {
                    limit: ctx.max_frame_bytes,
                });
                tracing::warn!(%conn_id, %peer, bytes, error = %err, "dropping frame");
            }
            LineRead::Line { bytes } => {
                stats.bytes_read += byte_count(bytes);
                let content = strip_terminator(&line);
                if content.is_empty() {
                    continue;
                }
                match relay_frame(content, peer, &ctx) {
                    Ok(()) => {
                        stats.frames_relayed += 1;
                        ctx.stats.record_relayed();
                    }
                    Err(err) => {
                        stats.frames_dropped += 1;
                        ctx.stats.record_dropped();
                        tracing::warn!(
                            %conn_id,
                            %peer,
                            bytes = content.len(),
                            error = %err,
                            "dropping frame"
                        );
                    }
                }
            }
        }
    }

    tracing::info!(
        %conn_id,
        %peer,
        bytes_read = stats.bytes_read,
        bytes_written = stats.bytes_written,
        frames_relayed = stats.frames_relayed,
        frames_dropped = stats.frames_dropped,
        "native client disconnected"
    );
    Ok(stats)
}

/// Parses one line and publishes it.
fn relay_frame(content: &[u8], peer: SocketAddr, ctx: &BridgeContext) -> Result<(), RelayError> {
    let frame = frame::parse(content)?;
    let shown = ctx.log_payloads.then_some(frame.payload.as_str());
    tracing::debug!(event = %frame.event, payload = ?shown, %peer, "relaying frame");

    let receivers = ctx.event_bus.publish(RelayEvent::from_frame(frame, peer));
    tracing::trace!(receivers, "frame published");
    Ok(())
}

/// Reads up to and including the next `\n` into `buf`.
///
/// Lines longer than `limit` are consumed but not kept. A final line
/// without a terminator is returned as a normal line at EOF.
async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>, limit: usize) -> std::io::Result<LineRead>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let mut consumed = 0usize;
    let mut overflow = false;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(if overflow {
                LineRead::TooLong { bytes: consumed }
            } else if consumed == 0 {
                LineRead::Eof
            } else {
                LineRead::Line { bytes: consumed }
            });
        }

        let (chunk, found) = match available.iter().position(|b| *b == b'\n') {
            Some(i) => (available.get(..=i).unwrap_or(available), true),
            None => (available, false),
        };
        let used = chunk.len();

        if !overflow {
            buf.extend_from_slice(chunk);
            if strip_terminator(buf).len() > limit {
                overflow = true;
                buf.clear();
            }
        }
        reader.consume(used);
        consumed += used;

        if found {
            return Ok(if overflow {
                LineRead::TooLong { bytes: consumed }
            } else {
                LineRead::Line { bytes: consumed }
            });
        }
    }
}

/// Strips one trailing `\n` and an optional `\r` before it.
fn strip_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn byte_count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use tokio::sync::broadcast;
    use tokio_test::io::Builder;

    use super::*;

    const GREETING: &str = "Hello from Express Backend";

    fn peer() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 45000))
    }

    fn context(max_frame_bytes: usize) -> BridgeContext {
        BridgeContext {
            event_bus: EventBus::new(64),
            greeting: Arc::from(GREETING),
            max_frame_bytes,
            log_payloads: false,
            stats: Arc::new(BridgeStats::new()),
        }
    }

    fn drain(rx: &mut broadcast::Receiver<RelayEvent>) -> Vec<(String, String)> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push((event.event, event.payload));
        }
        out
    }

    fn pair(event: &str, payload: &str) -> (String, String) {
        (event.to_string(), payload.to_string())
    }

    #[tokio::test]
    async fn greets_then_relays_frames_in_order() {
        let ctx = context(1024);
        let mut rx = ctx.event_bus.subscribe();
        let mock = Builder::new()
            .write(GREETING.as_bytes())
            .read(b"scoreUpdate: 42\n")
            .read(b"alert:\r\nclock: 12:30\n")
            .build();

        let Ok(stats) = run_session(mock, peer(), ctx.clone()).await else {
            panic!("session failed");
        };

        assert_eq!(
            drain(&mut rx),
            vec![
                pair("scoreUpdate", "42"),
                pair("alert", ""),
                pair("clock", "12:30"),
            ]
        );
        assert_eq!(stats.frames_relayed, 3);
        assert_eq!(stats.bytes_written, GREETING.len() as u64);
        assert_eq!(stats.bytes_read, 37);
    }

    #[tokio::test]
    async fn malformed_frame_is_dropped_and_session_continues() {
        let ctx = context(1024);
        let mut rx = ctx.event_bus.subscribe();
        let mock = Builder::new()
            .write(GREETING.as_bytes())
            .read(b"no-delimiter-here\n")
            .read(b"after: ok\n")
            .build();

        let Ok(stats) = run_session(mock, peer(), ctx.clone()).await else {
            panic!("session failed");
        };

        assert_eq!(drain(&mut rx), vec![pair("after", "ok")]);
        assert_eq!(stats.frames_dropped, 1);
        assert_eq!(ctx.stats.snapshot().frames_dropped, 1);
        assert_eq!(ctx.stats.snapshot().frames_relayed, 1);
    }

    #[tokio::test]
    async fn frame_split_across_reads_is_reassembled() {
        let ctx = context(1024);
        let mut rx = ctx.event_bus.subscribe();
        let mock = Builder::new()
            .write(GREETING.as_bytes())
            .read(b"score")
            .read(b"Update: 4")
            .read(b"2\nlast:tail")
            .build();

        let Ok(_) = run_session(mock, peer(), ctx.clone()).await else {
            panic!("session failed");
        };

        assert_eq!(
            drain(&mut rx),
            vec![pair("scoreUpdate", "42"), pair("last", "tail")]
        );
    }

    #[tokio::test]
    async fn empty_lines_are_ignored() {
        let ctx = context(1024);
        let mut rx = ctx.event_bus.subscribe();
        let mock = Builder::new()
            .write(GREETING.as_bytes())
            .read(b"\n\r\na:b\n")
            .build();

        let Ok(stats) = run_session(mock, peer(), ctx.clone()).await else {
            panic!("session failed");
        };

        assert_eq!(drain(&mut rx), vec![pair("a", "b")]);
        assert_eq!(stats.frames_dropped, 0);
    }

    #[tokio::test]
    async fn overlong_line_is_dropped_and_reader_resyncs() {
        let ctx = context(8);
        let mut rx = ctx.event_bus.subscribe();
        let mock = Builder::new()
            .write(GREETING.as_bytes())
            .read(b"waytoolong:")
            .read(b"payload\nok:1\n")
            .build();

        let Ok(stats) = run_session(mock, peer(), ctx.clone()).await else {
            panic!("session failed");
        };

        assert_eq!(drain(&mut rx), vec![pair("ok", "1")]);
        assert_eq!(stats.frames_dropped, 1);
    }

    #[tokio::test]
    async fn greeting_write_failure_is_a_connection_error() {
        let ctx = context(1024);
        let mock = Builder::new()
            .write_error(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
            .build();

        let result = run_session(mock, peer(), ctx.clone()).await;

        assert!(matches!(result, Err(RelayError::Connection { .. })));
        assert_eq!(ctx.stats.snapshot().active_connections, 0);
    }

    #[tokio::test]
    async fn read_failure_is_a_connection_error() {
        let ctx = context(1024);
        let mut rx = ctx.event_bus.subscribe();
        let mock = Builder::new()
            .write(GREETING.as_bytes())
            .read(b"first:1\n")
            .read_error(std::io::Error::from(std::io::ErrorKind::ConnectionReset))
            .build();

        let result = run_session(mock, peer(), ctx.clone()).await;

        assert!(matches!(result, Err(RelayError::Connection { .. })));
        assert_eq!(drain(&mut rx), vec![pair("first", "1")]);
    }

    #[test]
    fn strip_terminator_handles_crlf() {
        assert_eq!(strip_terminator(b"a:b\r\n"), b"a:b");
        assert_eq!(strip_terminator(b"a:b\n"), b"a:b");
        assert_eq!(strip_terminator(b"a:b"), b"a:b");
    }
}
