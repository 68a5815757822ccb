//! Letta REST API types.
//!
//! Provider-specific request/response structures. They are converted to and
//! from the provider-agnostic shapes in `rolechat-types::agent` at the edge.

use serde::{Deserialize, Serialize};

use rolechat_types::agent::{MemoryBlock, RemoteAgent};

/// Request body for `POST /v1/agents`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateAgentRequest {
    pub name: String,
    pub memory_blocks: Vec<MemoryBlock>,
    pub model: String,
    pub embedding: String,
}

/// Request body for `POST /v1/agents/{id}/messages/stream`.
#[derive(Debug, Clone, Serialize)]
pub struct StreamMessagesRequest {
    pub messages: Vec<LettaMessageCreate>,
    pub stream_tokens: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LettaMessageCreate {
    pub role: String,
    pub content: String,
}

/// The subset of an agent state record we read.
///
/// Memory blocks show up either nested under `memory.blocks` or flat as
/// `memory_blocks` / `memoryBlocks`, depending on endpoint and version.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentState {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub memory: Option<AgentMemory>,
    #[serde(default, alias = "memoryBlocks")]
    pub memory_blocks: Option<Vec<MemoryBlock>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentMemory {
    #[serde(default)]
    pub blocks: Vec<MemoryBlock>,
}

impl From<AgentState> for RemoteAgent {
    fn from(state: AgentState) -> Self {
        let blocks = match (state.memory, state.memory_blocks) {
            (Some(memory), _) if !memory.blocks.is_empty() => memory.blocks,
            (_, Some(flat)) => flat,
            _ => Vec::new(),
        };
        RemoteAgent {
            id: state.id,
            name: state.name,
            blocks,
        }
    }
}

/// `GET /v1/agents` answers with a bare array; some deployments wrap it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AgentList {
    Plain(Vec<AgentState>),
    Wrapped { agents: Vec<AgentState> },
}

impl AgentList {
    pub fn into_agents(self) -> Vec<AgentState> {
        match self {
            AgentList::Plain(agents) | AgentList::Wrapped { agents } => agents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_memory_blocks() {
        let json = r#"[{"id":"agent-1","name":"Luna","memory":{"blocks":[
            {"label":"persona","value":"curious"},{"label":"human","value":null}]}}]"#;
        let list: AgentList = serde_json::from_str(json).unwrap();
        let agent: RemoteAgent = list.into_agents().remove(0).into();
        assert_eq!(agent.id, "agent-1");
        assert_eq!(agent.persona(), "curious");
        assert_eq!(agent.human(), "");
    }

    #[test]
    fn test_flat_and_camel_case_blocks() {
        let flat: AgentState = serde_json::from_str(
            r#"{"id":"a","name":"n","memory_blocks":[{"label":"human","value":"Sam"}]}"#,
        )
        .unwrap();
        assert_eq!(RemoteAgent::from(flat).human(), "Sam");

        let camel: AgentState = serde_json::from_str(
            r#"{"id":"b","memoryBlocks":[{"label":"persona","value":"kind"}]}"#,
        )
        .unwrap();
        let agent = RemoteAgent::from(camel);
        assert_eq!(agent.persona(), "kind");
        assert_eq!(agent.name, "");
    }

    #[test]
    fn test_wrapped_list() {
        let list: AgentList =
            serde_json::from_str(r#"{"agents":[{"id":"x","name":"y"}]}"#).unwrap();
        assert_eq!(list.into_agents().len(), 1);
    }

    #[test]
    fn test_create_request_shape() {
        let req = CreateAgentRequest {
            name: "Bot".into(),
            memory_blocks: vec![MemoryBlock::new("persona", "p"), MemoryBlock::new("human", "h")],
            model: "openai/gpt-4o-mini".into(),
            embedding: "openai/text-embedding-3-small".into(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["memory_blocks"][1]["label"], "human");
        assert_eq!(json["memory_blocks"][1]["value"], "h");
    }
}
