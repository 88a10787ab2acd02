//! LLM Gateway port
//!
//! Defines the interface for the LLM capability the orchestration core
//! consumes. No retry happens inside this port; the core wraps calls in
//! its own retry policies explicitly.

use async_trait::async_trait;
use maestro_domain::{Message, chunk_text};
use thiserror::Error;

use crate::streaming::TokenStream;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Gateway for LLM communication
///
/// Given a prompt and optional prior turns, returns a completion. The
/// synchronous and streaming entry points of the agents are built on top
/// of this single asynchronous call.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send a query with conversation history and get the full completion.
    async fn achat(&self, query: &str, history: &[Message]) -> Result<String, GatewayError>;

    /// Send a query and get a chunked token stream.
    ///
    /// Default implementation calls [`achat`](LlmGateway::achat) and
    /// replays the result in 5-character chunks, so non-streaming
    /// providers work without changes.
    async fn astream_chat(
        &self,
        query: &str,
        history: &[Message],
    ) -> Result<TokenStream, GatewayError> {
        let text = self.achat(query, history).await?;
        Ok(TokenStream::from_chunks(chunk_text(&text, 5)))
    }
}
