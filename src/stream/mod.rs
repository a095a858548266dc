//! # Answer Stream Pipeline
//!
//! Turns the byte stream of a chat response into typed events.
//!
//! ```text
//! bytes ──► ChunkDecoder ──► LineFramer ──► interpret() ──► StreamChunk ──► mpsc
//!           (UTF-8 carry)    (\n carry)     (typed/drop)
//! ```
//!
//! The pipeline knows nothing about HTTP: [`pump`] accepts any stream of byte
//! buffers, which keeps it testable without a server.

pub mod decoder;
pub mod event;
pub mod framer;

pub use decoder::ChunkDecoder;
pub use event::{Citation, StreamEvent, interpret};
pub use framer::LineFramer;

use std::fmt::Display;

use futures::{Stream, StreamExt};
use log::{debug, info, warn};
use tokio::sync::mpsc::Sender;

/// What the pipeline hands to the session reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    /// First byte of the response body arrived.
    Opened,
    /// A recognized `sources` or `content` event, in arrival order.
    Event(StreamEvent),
}

/// Failures that end a stream early.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StreamError {
    /// The transport failed mid-body (connection reset, abort, ...).
    #[error("transport error: {0}")]
    Transport(String),
    /// The receiving side went away.
    #[error("channel closed")]
    ChannelClosed,
}

/// Counters for one completed stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub chunks: usize,
    pub bytes: usize,
    pub events: usize,
    /// Records dropped by the interpreter.
    pub dropped: usize,
    /// The stream ended in the middle of a record.
    pub truncated: bool,
}

/// Drive a byte stream through the decode → frame → interpret pipeline,
/// forwarding recognized events to `sender` in arrival order.
///
/// Returns when the body ends. A transport error is returned as
/// [`StreamError::Transport`]; every event decoded before it has already
/// been sent.
pub async fn pump<S, B, E>(body: S, sender: &Sender<StreamChunk>) -> Result<StreamStats, StreamError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut body = std::pin::pin!(body);
    let mut decoder = ChunkDecoder::new();
    let mut framer = LineFramer::new();
    let mut stats = StreamStats::default();

    while let Some(next) = body.next().await {
        let chunk = next.map_err(|e| {
            warn!("Stream transport error after {} bytes: {e}", stats.bytes);
            StreamError::Transport(e.to_string())
        })?;
        let bytes = chunk.as_ref();
        if bytes.is_empty() {
            continue;
        }

        if stats.chunks == 0 {
            send(sender, StreamChunk::Opened).await?;
        }
        stats.chunks += 1;
        stats.bytes += bytes.len();
        debug!("Raw chunk received: {} bytes", bytes.len());

        let text = decoder.decode(bytes);
        for record in framer.push(&text) {
            match interpret(&record) {
                StreamEvent::Unrecognized => stats.dropped += 1,
                event => {
                    stats.events += 1;
                    send(sender, StreamChunk::Event(event)).await?;
                }
            }
        }
    }

    let dangling_bytes = decoder.finish();
    if let Some(tail) = framer.finish() {
        warn!("Discarding truncated final record ({} chars)", tail.len());
        stats.truncated = true;
    } else if dangling_bytes > 0 {
        warn!("Discarding {dangling_bytes} incomplete UTF-8 byte(s) at end of stream");
        stats.truncated = true;
    }

    info!(
        "Stream ended: {} chunks, {} bytes, {} events, {} dropped",
        stats.chunks, stats.bytes, stats.events, stats.dropped
    );
    Ok(stats)
}

async fn send(sender: &Sender<StreamChunk>, chunk: StreamChunk) -> Result<(), StreamError> {
    sender.send(chunk).await.map_err(|_| {
        warn!("Stream chunk send failed: receiver dropped");
        StreamError::ChannelClosed
    })
}
