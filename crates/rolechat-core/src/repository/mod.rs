//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (rolechat-infra) implements. The core crate never depends on any
//! specific storage technology.

pub mod boxed;
pub mod message;
pub mod role;

pub use boxed::{BoxMessageRepository, BoxRoleRepository};
pub use message::MessageRepository;
pub use role::RoleRepository;
