//! Stream relay: raw passthrough to the client plus side-channel persistence.
//!
//! One relay run owns one chat turn after the user message is stored. Bytes
//! from the upstream are forwarded unmodified through an mpsc channel whose
//! receiver is the HTTP response body. A parsed copy of the same bytes feeds
//! the accumulator. Parsing never gates forwarding.
//!
//! Every exit path ends by dropping the sender, which ends the client stream.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use rolechat_types::error::UpstreamError;
use rolechat_types::message::{Message, MessageRole};
use rolechat_types::role::RoleId;

use super::extract::{Extracted, SseTextExtractor};
use crate::repository::MessageRepository;
use crate::upstream::AgentClient;

/// How a relay run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayEnd {
    /// Upstream body reached EOF.
    Completed,
    /// Upstream sent the `[DONE]` record.
    DoneSentinel,
    /// The client stopped reading.
    ClientDisconnected,
    /// The upstream request could not be established.
    UpstreamRejected,
    /// The upstream body failed after it started.
    StreamFailed,
}

impl fmt::Display for RelayEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelayEnd::Completed => "completed",
            RelayEnd::DoneSentinel => "done_sentinel",
            RelayEnd::ClientDisconnected => "client_disconnected",
            RelayEnd::UpstreamRejected => "upstream_rejected",
            RelayEnd::StreamFailed => "stream_failed",
        };
        f.write_str(s)
    }
}

/// Summary of one relay run.
#[derive(Debug, Clone)]
pub struct RelayOutcome {
    pub end: RelayEnd,
    pub bytes_forwarded: u64,
    /// Characters of assistant text reconstructed.
    pub chars: usize,
    /// The stored assistant message, if one was written.
    pub assistant_message: Option<Message>,
}

/// One chat turn handed to the relay.
#[derive(Debug, Clone)]
pub struct RelayRequest {
    pub role_id: RoleId,
    pub agent_id: String,
    pub text: String,
}

#[derive(Serialize)]
struct ErrorEvent<'a> {
    error: &'a str,
    detail: String,
}

/// Terminal event sent when the upstream stream cannot be opened.
pub fn upstream_error_event(err: &UpstreamError) -> Bytes {
    let event = ErrorEvent {
        error: "Upstream error",
        detail: err.detail(),
    };
    let payload = serde_json::to_string(&event)
        .unwrap_or_else(|_| r#"{"error":"Upstream error"}"#.to_string());
    Bytes::from(format!("data: {payload}\n\n"))
}

/// Terminal event sent when the upstream stream breaks midway.
pub fn stream_failed_event() -> Bytes {
    Bytes::from_static(b"data: {\"error\":\"Failed to fetch stream\"}\n\n")
}

/// Run one relay to completion. Never fails; the outcome says how it ended.
pub async fn run_relay<M, A>(
    agent: Arc<A>,
    messages: Arc<M>,
    request: RelayRequest,
    tx: mpsc::Sender<Bytes>,
) -> RelayOutcome
where
    M: MessageRepository,
    A: AgentClient,
{
    let RelayRequest {
        role_id,
        agent_id,
        text,
    } = request;

    let mut outcome = RelayOutcome {
        end: RelayEnd::Completed,
        bytes_forwarded: 0,
        chars: 0,
        assistant_message: None,
    };

    let mut upstream = match agent.open_chat_stream(&agent_id, &text).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!(role_id = %role_id, agent_id = %agent_id, error = %e, "upstream stream rejected");
            let _ = tx.send(upstream_error_event(&e)).await;
            outcome.end = RelayEnd::UpstreamRejected;
            log_outcome(&role_id, &outcome);
            return outcome;
        }
    };

    let mut extractor = SseTextExtractor::new();
    let mut accumulated = String::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = tx.closed() => {
                outcome.end = RelayEnd::ClientDisconnected;
                break;
            }
            next = upstream.next() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                let len = chunk.len() as u64;
                if tx.send(chunk.clone()).await.is_err() {
                    outcome.end = RelayEnd::ClientDisconnected;
                    break;
                }
                outcome.bytes_forwarded += len;

                let mut done = false;
                for item in extractor.push(&chunk) {
                    match item {
                        Extracted::Text(t) => accumulated.push_str(&t),
                        Extracted::Done => done = true,
                    }
                }
                if done {
                    outcome.end = RelayEnd::DoneSentinel;
                    break;
                }
            }
            Some(Err(e)) => {
                warn!(role_id = %role_id, error = %e, "upstream stream failed midway");
                let _ = tx.send(stream_failed_event()).await;
                outcome.end = RelayEnd::StreamFailed;
                break;
            }
            None => {
                if let Some(Extracted::Text(t)) = extractor.finish() {
                    accumulated.push_str(&t);
                }
                break;
            }
        }
    }
    drop(upstream);

    outcome.chars = accumulated.chars().count();
    if accumulated.is_empty() {
        debug!(role_id = %role_id, "no assistant text accumulated, nothing stored");
    } else {
        let message = Message {
            id: Uuid::now_v7(),
            role_id: role_id.clone(),
            role: MessageRole::Assistant,
            content: accumulated,
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        match messages.append(&message).await {
            Ok(stored) => outcome.assistant_message = Some(stored),
            Err(e) => {
                error!(role_id = %role_id, error = %e, "failed to persist assistant message");
            }
        }
    }

    log_outcome(&role_id, &outcome);
    drop(tx);
    outcome
}

fn log_outcome(role_id: &RoleId, outcome: &RelayOutcome) {
    info!(
        role_id = %role_id,
        end = %outcome.end,
        bytes = outcome.bytes_forwarded,
        chars = outcome.chars,
        persisted = outcome.assistant_message.is_some(),
        "relay finished"
    );
}
