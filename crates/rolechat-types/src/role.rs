use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Unique identifier for a role, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub Uuid);

impl RoleId {
    /// Create a new RoleId using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create a RoleId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RoleId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A locally defined chat persona bound to one upstream conversational agent.
///
/// `agent_id` stays `None` only between local insertion and the upstream
/// agent being created. Once set it never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    /// Free-text persona memory block handed to the upstream agent.
    pub persona: String,
    /// Free-text description of the human the agent talks to.
    pub human: String,
    /// Opaque id of the remote agent this role is correlated with.
    pub agent_id: Option<String>,
    /// Serialized as epoch milliseconds to match the frontend contract.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Role {
    /// Build a fresh, unbound role stamped with the current time.
    pub fn new(
        name: impl Into<String>,
        persona: impl Into<String>,
        human: impl Into<String>,
    ) -> Self {
        Self {
            id: RoleId::new(),
            name: name.into(),
            persona: persona.into(),
            human: human.into(),
            agent_id: None,
            created_at: Utc::now(),
        }
    }

    /// Whether an upstream agent has been bound to this role.
    pub fn is_bound(&self) -> bool {
        self.agent_id.is_some()
    }
}

/// Request body for creating a role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(default)]
    pub persona: String,
    #[serde(default)]
    pub human: String,
}

/// Result of reconciling local roles against the upstream agent list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub success: bool,
    /// Number of agents the upstream currently reports.
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pruned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_count: Option<u64>,
}
