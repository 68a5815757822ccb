//! One-shot chat from the terminal.
//!
//! Runs a turn through the same `ChatService` the HTTP endpoint uses and
//! folds the relayed bytes through `SseTextExtractor`, printing each text
//! delta as it arrives.

use std::io::Write;

use anyhow::Result;
use console::style;

use rolechat_core::chat::{Extracted, RelayEnd, SseTextExtractor};
use rolechat_types::role::RoleId;

use rolechat_api::state::AppState;

/// The assistant reply as it grows, one delta at a time.
#[derive(Debug, Default)]
struct Reply {
    text: String,
}

impl Reply {
    /// Apply one record; returns the new delta, if any.
    fn apply(&mut self, item: Extracted) -> Option<String> {
        match item {
            Extracted::Text(delta) => {
                self.text.push_str(&delta);
                Some(delta)
            }
            Extracted::Done => None,
        }
    }
}

/// Send `message` to a role and stream the reply to stdout.
pub async fn chat_once(state: &AppState, role_id: &str, message: &str, json: bool) -> Result<()> {
    let role_id: RoleId = role_id
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid role id '{role_id}': {e}"))?;

    let mut turn = state.chat_service.send_message(&role_id, message).await?;

    let mut extractor = SseTextExtractor::new();
    let mut reply = Reply::default();
    let mut stdout = std::io::stdout();

    if !json {
        print!("\n  {}  ", style("bot").magenta().bold());
    }

    while let Some(chunk) = turn.body.recv().await {
        for item in extractor.push(&chunk) {
            if let Some(delta) = reply.apply(item) {
                if !json {
                    write!(stdout, "{delta}")?;
                    stdout.flush()?;
                }
            }
        }
    }
    if let Some(delta) = extractor.finish().and_then(|item| reply.apply(item)) {
        if !json {
            write!(stdout, "{delta}")?;
        }
    }

    let outcome = turn.relay.await?;
    tracing::debug!(end = %outcome.end, bytes = outcome.bytes_forwarded, "chat turn finished");

    if json {
        let out = serde_json::json!({
            "roleId": role_id,
            "reply": reply.text,
            "end": outcome.end.to_string(),
            "assistantMessage": outcome.assistant_message,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("\n");
    }

    match outcome.end {
        RelayEnd::UpstreamRejected | RelayEnd::StreamFailed => {
            anyhow::bail!("upstream stream ended with {}", outcome.end)
        }
        _ => Ok(()),
    }
}
