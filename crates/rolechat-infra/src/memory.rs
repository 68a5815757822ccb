//! In-memory role and message store.
//!
//! One `InMemoryStore` implements both repository traits over shared state,
//! so the same referential rules as the SQLite schema hold: messages need an
//! existing role, agent ids are unique, deleting a role drops its messages.
//! Cloning shares the underlying state.

use std::sync::Arc;

use tokio::sync::RwLock;

use rolechat_core::repository::{MessageRepository, RoleRepository};
use rolechat_types::error::RepositoryError;
use rolechat_types::message::Message;
use rolechat_types::role::{Role, RoleId};

#[derive(Debug, Default)]
struct State {
    /// Insertion order.
    roles: Vec<Role>,
    /// Insertion order.
    messages: Vec<Message>,
}

impl State {
    fn role_mut(&mut self, id: &RoleId) -> Option<&mut Role> {
        self.roles.iter_mut().find(|r| &r.id == id)
    }

    fn agent_taken(&self, agent_id: &str, except: Option<&RoleId>) -> bool {
        self.roles
            .iter()
            .any(|r| r.agent_id.as_deref() == Some(agent_id) && Some(&r.id) != except)
    }

    fn remove_roles(&mut self, doomed: impl Fn(&Role) -> bool) -> u64 {
        let removed: Vec<RoleId> = self
            .roles
            .iter()
            .filter(|r| doomed(r))
            .map(|r| r.id.clone())
            .collect();
        self.roles.retain(|r| !removed.contains(&r.id));
        self.messages.retain(|m| !removed.contains(&m.role_id));
        removed.len() as u64
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoleRepository for InMemoryStore {
    async fn create(&self, role: &Role) -> Result<Role, RepositoryError> {
        let mut state = self.state.write().await;
        if state.roles.iter().any(|r| r.id == role.id) {
            return Err(RepositoryError::Conflict(format!("role '{}' already exists", role.id)));
        }
        if let Some(agent_id) = &role.agent_id {
            if state.agent_taken(agent_id, None) {
                return Err(RepositoryError::Conflict(format!(
                    "agent '{agent_id}' is bound to another role"
                )));
            }
        }
        state.roles.push(role.clone());
        Ok(role.clone())
    }

    async fn get(&self, id: &RoleId) -> Result<Option<Role>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.roles.iter().find(|r| &r.id == id).cloned())
    }

    async fn get_by_agent_id(&self, agent_id: &str) -> Result<Option<Role>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .roles
            .iter()
            .find(|r| r.agent_id.as_deref() == Some(agent_id))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Role>, RepositoryError> {
        let state = self.state.read().await;
        // Reverse first so the stable sort leaves later inserts ahead on ties.
        let mut roles: Vec<Role> = state.roles.iter().rev().cloned().collect();
        roles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(roles)
    }

    async fn bind_agent(&self, id: &RoleId, agent_id: &str) -> Result<Role, RepositoryError> {
        let mut state = self.state.write().await;
        if state.agent_taken(agent_id, Some(id)) {
            return Err(RepositoryError::Conflict(format!(
                "agent '{agent_id}' is bound to another role"
            )));
        }
        let role = state.role_mut(id).ok_or(RepositoryError::NotFound)?;
        if let Some(current) = role.agent_id.as_deref() {
            if current != agent_id {
                return Err(RepositoryError::Conflict(format!(
                    "role '{id}' is already bound to agent '{current}'"
                )));
            }
            return Ok(role.clone());
        }
        role.agent_id = Some(agent_id.to_string());
        Ok(role.clone())
    }

    async fn update_profile(
        &self,
        agent_id: &str,
        name: &str,
        persona: &str,
        human: &str,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        let role = state
            .roles
            .iter_mut()
            .find(|r| r.agent_id.as_deref() == Some(agent_id))
            .ok_or(RepositoryError::NotFound)?;
        role.name = name.to_string();
        role.persona = persona.to_string();
        role.human = human.to_string();
        Ok(())
    }

    async fn delete(&self, id: &RoleId) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        match state.remove_roles(|r| &r.id == id) {
            0 => Err(RepositoryError::NotFound),
            _ => Ok(()),
        }
    }

    async fn list_agent_ids(&self) -> Result<Vec<String>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.roles.iter().filter_map(|r| r.agent_id.clone()).collect())
    }

    async fn delete_by_agent_ids(&self, agent_ids: &[String]) -> Result<u64, RepositoryError> {
        let mut state = self.state.write().await;
        Ok(state.remove_roles(|r| r.agent_id.as_ref().is_some_and(|a| agent_ids.contains(a))))
    }
}

impl MessageRepository for InMemoryStore {
    async fn append(&self, message: &Message) -> Result<Message, RepositoryError> {
        let mut state = self.state.write().await;
        if !state.roles.iter().any(|r| r.id == message.role_id) {
            return Err(RepositoryError::NotFound);
        }
        state.messages.push(message.clone());
        Ok(message.clone())
    }

    async fn history(&self, role_id: &RoleId) -> Result<Vec<Message>, RepositoryError> {
        let state = self.state.read().await;
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| &m.role_id == role_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rolechat_types::message::MessageRole;
    use uuid::Uuid;

    fn msg(role_id: &RoleId, content: &str, timestamp: i64) -> Message {
        Message {
            id: Uuid::now_v7(),
            role_id: role_id.clone(),
            role: MessageRole::User,
            content: content.to_string(),
            timestamp,
        }
    }

    #[tokio::test]
    async fn test_list_newest_first_ties_by_insertion() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let mut old = Role::new("old", "", "");
        old.created_at = now - Duration::seconds(5);
        let mut a = Role::new("a", "", "");
        a.created_at = now;
        let mut b = Role::new("b", "", "");
        b.created_at = now;

        for role in [&old, &a, &b] {
            store.create(role).await.unwrap();
        }

        let names: Vec<String> = store.list().await.unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["b", "a", "old"]);
    }

    #[tokio::test]
    async fn test_bind_agent_rules() {
        let store = InMemoryStore::new();
        let first = Role::new("first", "", "");
        let second = Role::new("second", "", "");
        store.create(&first).await.unwrap();
        store.create(&second).await.unwrap();

        store.bind_agent(&first.id, "agent-1").await.unwrap();
        assert!(store.bind_agent(&first.id, "agent-1").await.is_ok());
        assert!(matches!(
            store.bind_agent(&first.id, "agent-2").await,
            Err(RepositoryError::Conflict(_))
        ));
        assert!(matches!(
            store.bind_agent(&second.id, "agent-1").await,
            Err(RepositoryError::Conflict(_))
        ));
        assert!(matches!(
            store.bind_agent(&RoleId::new(), "agent-3").await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_messages_require_role_and_cascade() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.append(&msg(&RoleId::new(), "orphan", 1)).await,
            Err(RepositoryError::NotFound)
        ));

        let mut role = Role::new("r", "", "");
        role.agent_id = Some("agent-9".to_string());
        store.create(&role).await.unwrap();
        store.append(&msg(&role.id, "b", 2)).await.unwrap();
        store.append(&msg(&role.id, "a", 1)).await.unwrap();
        store.append(&msg(&role.id, "c", 2)).await.unwrap();

        let contents: Vec<String> = store
            .history(&role.id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["a", "b", "c"]);

        assert_eq!(store.delete_by_agent_ids(&["agent-9".to_string()]).await.unwrap(), 1);
        assert!(store.history(&role.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = InMemoryStore::new();
        let other = store.clone();
        let role = Role::new("shared", "", "");
        store.create(&role).await.unwrap();
        assert!(other.get(&role.id).await.unwrap().is_some());
    }
}
