//! Streaming adapter.
//!
//! Converts complete responses into chunked token sequences and bridges
//! asynchronous iteration to blocking callers. Consumers may assume the
//! yielded chunks concatenate to the full final answer and that no chunk
//! is empty.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use maestro_domain::{AgentCallbacks, chunk_text};
use tokio::sync::mpsc;

use crate::bridge::{BlockingBridge, BridgeError};

/// Chunk size for default streaming replay.
pub const DEFAULT_CHUNK_SIZE: usize = 5;
/// Chunk size for the planning strategy's detailed trace.
pub const DETAILED_CHUNK_SIZE: usize = 15;

/// An ordered sequence of text chunks from an orchestration run.
///
/// Wraps an `mpsc::Receiver<String>` and implements [`Stream`]. Producers
/// are either [`replay`](TokenStream::replay) tasks chunking a complete
/// answer, or strategy tasks interleaving progress narration with the
/// final chunks.
pub struct TokenStream {
    receiver: mpsc::Receiver<String>,
}

impl TokenStream {
    pub fn new(receiver: mpsc::Receiver<String>) -> Self {
        Self { receiver }
    }

    /// Create a sender/stream pair for a producer task.
    pub fn channel(buffer: usize) -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self::new(rx))
    }

    /// Build a stream from pre-computed chunks, no producer task needed.
    ///
    /// Empty chunks are skipped.
    pub fn from_chunks(chunks: Vec<String>) -> Self {
        let (tx, rx) = mpsc::channel(chunks.len().max(1));
        for chunk in chunks {
            if chunk.is_empty() {
                continue;
            }
            // Capacity covers every chunk, so try_send cannot fail here
            let _ = tx.try_send(chunk);
        }
        Self::new(rx)
    }

    /// Replay a complete answer as fixed-size character chunks.
    ///
    /// Spawns a producer task (requires an ambient tokio runtime) that
    /// fires `on_new_token` per chunk, sleeps `delay` between chunks, and
    /// — when `end_agent` is set — fires `on_agent_end` for that agent
    /// after the last chunk.
    pub fn replay(
        text: impl Into<String>,
        chunk_size: usize,
        callbacks: Arc<dyn AgentCallbacks>,
        delay: Duration,
        end_agent: Option<String>,
    ) -> Self {
        let chunks = chunk_text(&text.into(), chunk_size);
        let (tx, stream) = Self::channel(32);

        tokio::spawn(async move {
            for chunk in chunks {
                callbacks.on_new_token(&chunk);
                if tx.send(chunk).await.is_err() {
                    // Consumer dropped the stream; stop producing
                    break;
                }
                tokio::time::sleep(delay).await;
            }
            if let Some(agent_name) = end_agent {
                callbacks.on_agent_end(&agent_name);
            }
        });

        stream
    }

    /// Consume the stream and concatenate every chunk.
    pub async fn collect_text(mut self) -> String {
        let mut text = String::new();
        while let Some(chunk) = self.receiver.recv().await {
            text.push_str(&chunk);
        }
        text
    }

    /// Expose this stream as a blocking iterator for synchronous callers.
    pub fn into_blocking(self) -> Result<BlockingTokenStream, BridgeError> {
        Ok(BlockingTokenStream::new(BlockingBridge::acquire()?, self))
    }
}

impl Stream for TokenStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Blocking iterator over a [`TokenStream`].
///
/// Owns the bridge that drives the producer task: with a private runtime,
/// the producer makes progress only while the consumer iterates, which is
/// exactly the pull-driven behavior a synchronous caller expects.
pub struct BlockingTokenStream {
    bridge: BlockingBridge,
    inner: TokenStream,
}

impl BlockingTokenStream {
    pub fn new(bridge: BlockingBridge, inner: TokenStream) -> Self {
        Self { bridge, inner }
    }
}

impl Iterator for BlockingTokenStream {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.bridge.block_on(self.inner.receiver.recv())
    }
}
