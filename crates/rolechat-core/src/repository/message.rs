//! Message repository trait definition.

use rolechat_types::error::RepositoryError;
use rolechat_types::message::Message;
use rolechat_types::role::RoleId;

/// Append-only store of chat messages keyed by role.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait MessageRepository: Send + Sync {
    /// Persist one message. Returns `NotFound` if its role does not exist.
    fn append(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<Message, RepositoryError>> + Send;

    /// Messages of a role ordered by timestamp ascending, ties in insertion order.
    fn history(
        &self,
        role_id: &RoleId,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;
}
