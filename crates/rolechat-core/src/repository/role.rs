//! Role repository trait definition.

use rolechat_types::error::RepositoryError;
use rolechat_types::role::{Role, RoleId};

/// Repository trait for role persistence.
///
/// Implementations live in rolechat-infra (SQLite and in-memory).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait RoleRepository: Send + Sync {
    /// Insert a new role. Returns the stored role.
    fn create(
        &self,
        role: &Role,
    ) -> impl std::future::Future<Output = Result<Role, RepositoryError>> + Send;

    /// Get a role by its local ID.
    fn get(
        &self,
        id: &RoleId,
    ) -> impl std::future::Future<Output = Result<Option<Role>, RepositoryError>> + Send;

    /// Get the role bound to an upstream agent.
    fn get_by_agent_id(
        &self,
        agent_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Role>, RepositoryError>> + Send;

    /// All roles, newest first.
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<Role>, RepositoryError>> + Send;

    /// Set the upstream agent id of a role.
    ///
    /// Binding the id a role already carries is a no-op. Binding a different
    /// id returns `Conflict`; an unknown role returns `NotFound`.
    fn bind_agent(
        &self,
        id: &RoleId,
        agent_id: &str,
    ) -> impl std::future::Future<Output = Result<Role, RepositoryError>> + Send;

    /// Overwrite name/persona/human of the role bound to `agent_id`.
    fn update_profile(
        &self,
        agent_id: &str,
        name: &str,
        persona: &str,
        human: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Permanently delete a role (and its messages).
    fn delete(
        &self,
        id: &RoleId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Agent ids of every bound role.
    fn list_agent_ids(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<String>, RepositoryError>> + Send;

    /// Delete every role bound to one of `agent_ids`. Returns the number removed.
    fn delete_by_agent_ids(
        &self,
        agent_ids: &[String],
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
