//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod message;
pub mod pool;
pub mod role;

pub use message::SqliteMessageRepository;
pub use pool::DatabasePool;
pub use role::SqliteRoleRepository;
