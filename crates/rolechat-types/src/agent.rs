//! Upstream agent shapes as seen by the domain layer.
//!
//! The provider wire format lives in rolechat-infra; this is the normalized
//! view that role sync works with.

use serde::{Deserialize, Serialize};

/// Well-known memory block label carrying the agent's persona.
pub const PERSONA_LABEL: &str = "persona";
/// Well-known memory block label describing the human.
pub const HUMAN_LABEL: &str = "human";

/// A labelled chunk of agent core memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryBlock {
    pub label: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl MemoryBlock {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: Some(value.into()),
        }
    }
}

/// An agent as reported by the upstream provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAgent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub blocks: Vec<MemoryBlock>,
}

impl RemoteAgent {
    /// Value of the first block with `label`, or an empty string.
    pub fn block_value(&self, label: &str) -> String {
        self.blocks
            .iter()
            .find(|b| b.label == label)
            .and_then(|b| b.value.clone())
            .unwrap_or_default()
    }

    pub fn persona(&self) -> String {
        self.block_value(PERSONA_LABEL)
    }

    pub fn human(&self) -> String {
        self.block_value(HUMAN_LABEL)
    }
}

/// What the role service asks the upstream to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAgent {
    pub name: String,
    pub persona: String,
    pub human: String,
}
