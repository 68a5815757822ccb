//! Chat turn orchestration.
//!
//! `ChatService` validates a send, resolves the role to its upstream agent,
//! stores the user message, then spawns the stream relay and hands the
//! caller the receiving end of the relay's output channel.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use rolechat_types::error::ChatError;
use rolechat_types::message::{Message, MessageRole};
use rolechat_types::role::RoleId;

use super::gate::TurnGate;
use super::relay::{RelayOutcome, RelayRequest, run_relay};
use crate::repository::{MessageRepository, RoleRepository};
use crate::upstream::AgentClient;

/// Chunks buffered between the relay and a slow client.
const CHANNEL_CAPACITY: usize = 64;

/// A running chat turn.
///
/// `body` yields the raw upstream bytes and any terminal error event, then
/// closes. `relay` resolves with the run summary; dropping it detaches the
/// relay without cancelling it.
pub struct ChatStream {
    pub body: mpsc::Receiver<Bytes>,
    pub relay: JoinHandle<RelayOutcome>,
}

pub struct ChatService<R, M, A> {
    roles: Arc<R>,
    messages: Arc<M>,
    agent: Arc<A>,
    gate: Option<TurnGate>,
}

impl<R, M, A> ChatService<R, M, A>
where
    R: RoleRepository + 'static,
    M: MessageRepository + 'static,
    A: AgentClient + 'static,
{
    /// With `serialize_turns`, at most one turn per role is in flight.
    pub fn new(roles: Arc<R>, messages: Arc<M>, agent: Arc<A>, serialize_turns: bool) -> Self {
        Self {
            roles,
            messages,
            agent,
            gate: serialize_turns.then(TurnGate::new),
        }
    }

    /// Start a chat turn.
    ///
    /// Everything that can fail before the event stream begins fails here:
    /// empty text, unknown role, unbound role, user message not stored.
    /// Upstream failures surface inside the returned stream instead.
    pub async fn send_message(
        &self,
        role_id: &RoleId,
        text: &str,
    ) -> Result<ChatStream, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let role = self
            .roles
            .get(role_id)
            .await
            .map_err(|e| ChatError::Storage(e.to_string()))?
            .ok_or(ChatError::RoleNotFound)?;
        let agent_id = role.agent_id.ok_or(ChatError::AgentNotBound)?;

        let permit = match &self.gate {
            Some(gate) => Some(gate.acquire(role_id).await),
            None => None,
        };

        let user_message = Message {
            id: Uuid::now_v7(),
            role_id: role_id.clone(),
            role: MessageRole::User,
            content: text.to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        self.messages
            .append(&user_message)
            .await
            .map_err(|e| ChatError::Storage(e.to_string()))?;

        let (tx, body) = mpsc::channel(CHANNEL_CAPACITY);
        let request = RelayRequest {
            role_id: role_id.clone(),
            agent_id,
            text: text.to_string(),
        };
        let agent = Arc::clone(&self.agent);
        let messages = Arc::clone(&self.messages);

        let relay = tokio::spawn(async move {
            let outcome = run_relay(agent, messages, request, tx).await;
            drop(permit);
            outcome
        });

        Ok(ChatStream { body, relay })
    }

    /// Stored messages of a role, oldest first.
    pub async fn history(&self, role_id: &RoleId) -> Result<Vec<Message>, ChatError> {
        let exists = self
            .roles
            .get(role_id)
            .await
            .map_err(|e| ChatError::Storage(e.to_string()))?
            .is_some();
        if !exists {
            return Err(ChatError::RoleNotFound);
        }
        self.messages
            .history(role_id)
            .await
            .map_err(|e| ChatError::Storage(e.to_string()))
    }
}
