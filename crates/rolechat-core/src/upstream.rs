//! AgentClient trait definition.
//!
//! The port to the hosted conversational-agent provider. Uses RPITIT for the
//! request/response calls; the chat stream itself is a boxed byte stream so
//! the relay can own it inside a spawned task.

use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

use rolechat_types::agent::{NewAgent, RemoteAgent};
use rolechat_types::error::UpstreamError;

/// Raw upstream response body, chunked as the transport delivered it.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, UpstreamError>> + Send + 'static>>;

/// Client for the upstream agent provider.
///
/// Implementations live in rolechat-infra (e.g., `LettaAgentClient`).
pub trait AgentClient: Send + Sync {
    /// Create a remote agent with `persona` and `human` memory blocks.
    /// Returns the provider's opaque agent id.
    fn create_agent(
        &self,
        agent: &NewAgent,
    ) -> impl std::future::Future<Output = Result<String, UpstreamError>> + Send;

    /// Every agent the provider currently knows about.
    fn list_agents(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<RemoteAgent>, UpstreamError>> + Send;

    /// Start a streaming chat turn against `agent_id`.
    ///
    /// Resolves once the response status is known. A non-2xx response
    /// resolves to `UpstreamError::Status` with the body attached.
    fn open_chat_stream(
        &self,
        agent_id: &str,
        text: &str,
    ) -> impl std::future::Future<Output = Result<ByteStream, UpstreamError>> + Send;
}
