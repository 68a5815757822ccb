//! Object-safe dynamic dispatch wrappers for the repository traits.
//!
//! Same blanket-impl pattern as the agent client wrappers:
//! 1. Define an object-safe `XDyn` trait with boxed futures
//! 2. Blanket-impl `XDyn` for all `T: X`
//! 3. `BoxX` wraps `Arc<dyn XDyn>` and implements `X` by delegation
//!
//! This lets the runtime choose the SQLite or in-memory backend from config
//! while services stay generic over the traits.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rolechat_types::error::RepositoryError;
use rolechat_types::message::Message;
use rolechat_types::role::{Role, RoleId};

use super::message::MessageRepository;
use super::role::RoleRepository;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RepositoryError>> + Send + 'a>>;

/// Object-safe version of [`RoleRepository`].
pub trait RoleRepositoryDyn: Send + Sync {
    fn create_boxed<'a>(&'a self, role: &'a Role) -> BoxFuture<'a, Role>;
    fn get_boxed<'a>(&'a self, id: &'a RoleId) -> BoxFuture<'a, Option<Role>>;
    fn get_by_agent_id_boxed<'a>(&'a self, agent_id: &'a str) -> BoxFuture<'a, Option<Role>>;
    fn list_boxed(&self) -> BoxFuture<'_, Vec<Role>>;
    fn bind_agent_boxed<'a>(&'a self, id: &'a RoleId, agent_id: &'a str) -> BoxFuture<'a, Role>;
    fn update_profile_boxed<'a>(
        &'a self,
        agent_id: &'a str,
        name: &'a str,
        persona: &'a str,
        human: &'a str,
    ) -> BoxFuture<'a, ()>;
    fn delete_boxed<'a>(&'a self, id: &'a RoleId) -> BoxFuture<'a, ()>;
    fn list_agent_ids_boxed(&self) -> BoxFuture<'_, Vec<String>>;
    fn delete_by_agent_ids_boxed<'a>(&'a self, agent_ids: &'a [String]) -> BoxFuture<'a, u64>;
}

impl<T: RoleRepository> RoleRepositoryDyn for T {
    fn create_boxed<'a>(&'a self, role: &'a Role) -> BoxFuture<'a, Role> {
        Box::pin(self.create(role))
    }

    fn get_boxed<'a>(&'a self, id: &'a RoleId) -> BoxFuture<'a, Option<Role>> {
        Box::pin(self.get(id))
    }

    fn get_by_agent_id_boxed<'a>(&'a self, agent_id: &'a str) -> BoxFuture<'a, Option<Role>> {
        Box::pin(self.get_by_agent_id(agent_id))
    }

    fn list_boxed(&self) -> BoxFuture<'_, Vec<Role>> {
        Box::pin(self.list())
    }

    fn bind_agent_boxed<'a>(&'a self, id: &'a RoleId, agent_id: &'a str) -> BoxFuture<'a, Role> {
        Box::pin(self.bind_agent(id, agent_id))
    }

    fn update_profile_boxed<'a>(
        &'a self,
        agent_id: &'a str,
        name: &'a str,
        persona: &'a str,
        human: &'a str,
    ) -> BoxFuture<'a, ()> {
        Box::pin(self.update_profile(agent_id, name, persona, human))
    }

    fn delete_boxed<'a>(&'a self, id: &'a RoleId) -> BoxFuture<'a, ()> {
        Box::pin(self.delete(id))
    }

    fn list_agent_ids_boxed(&self) -> BoxFuture<'_, Vec<String>> {
        Box::pin(self.list_agent_ids())
    }

    fn delete_by_agent_ids_boxed<'a>(&'a self, agent_ids: &'a [String]) -> BoxFuture<'a, u64> {
        Box::pin(self.delete_by_agent_ids(agent_ids))
    }
}

/// Type-erased role repository for runtime backend selection.
#[derive(Clone)]
pub struct BoxRoleRepository {
    inner: Arc<dyn RoleRepositoryDyn>,
}

impl BoxRoleRepository {
    pub fn new<T: RoleRepository + 'static>(repo: T) -> Self {
        Self {
            inner: Arc::new(repo),
        }
    }
}

impl RoleRepository for BoxRoleRepository {
    async fn create(&self, role: &Role) -> Result<Role, RepositoryError> {
        self.inner.create_boxed(role).await
    }

    async fn get(&self, id: &RoleId) -> Result<Option<Role>, RepositoryError> {
        self.inner.get_boxed(id).await
    }

    async fn get_by_agent_id(&self, agent_id: &str) -> Result<Option<Role>, RepositoryError> {
        self.inner.get_by_agent_id_boxed(agent_id).await
    }

    async fn list(&self) -> Result<Vec<Role>, RepositoryError> {
        self.inner.list_boxed().await
    }

    async fn bind_agent(&self, id: &RoleId, agent_id: &str) -> Result<Role, RepositoryError> {
        self.inner.bind_agent_boxed(id, agent_id).await
    }

    async fn update_profile(
        &self,
        agent_id: &str,
        name: &str,
        persona: &str,
        human: &str,
    ) -> Result<(), RepositoryError> {
        self.inner
            .update_profile_boxed(agent_id, name, persona, human)
            .await
    }

    async fn delete(&self, id: &RoleId) -> Result<(), RepositoryError> {
        self.inner.delete_boxed(id).await
    }

    async fn list_agent_ids(&self) -> Result<Vec<String>, RepositoryError> {
        self.inner.list_agent_ids_boxed().await
    }

    async fn delete_by_agent_ids(&self, agent_ids: &[String]) -> Result<u64, RepositoryError> {
        self.inner.delete_by_agent_ids_boxed(agent_ids).await
    }
}

/// Object-safe version of [`MessageRepository`].
pub trait MessageRepositoryDyn: Send + Sync {
    fn append_boxed<'a>(&'a self, message: &'a Message) -> BoxFuture<'a, Message>;
    fn history_boxed<'a>(&'a self, role_id: &'a RoleId) -> BoxFuture<'a, Vec<Message>>;
}

impl<T: MessageRepository> MessageRepositoryDyn for T {
    fn append_boxed<'a>(&'a self, message: &'a Message) -> BoxFuture<'a, Message> {
        Box::pin(self.append(message))
    }

    fn history_boxed<'a>(&'a self, role_id: &'a RoleId) -> BoxFuture<'a, Vec<Message>> {
        Box::pin(self.history(role_id))
    }
}

/// Type-erased message repository for runtime backend selection.
#[derive(Clone)]
pub struct BoxMessageRepository {
    inner: Arc<dyn MessageRepositoryDyn>,
}

impl BoxMessageRepository {
    pub fn new<T: MessageRepository + 'static>(repo: T) -> Self {
        Self {
            inner: Arc::new(repo),
        }
    }
}

impl MessageRepository for BoxMessageRepository {
    async fn append(&self, message: &Message) -> Result<Message, RepositoryError> {
        self.inner.append_boxed(message).await
    }

    async fn history(&self, role_id: &RoleId) -> Result<Vec<Message>, RepositoryError> {
        self.inner.history_boxed(role_id).await
    }
}
