//! Shared domain types for rolechat.
//!
//! Roles, messages, upstream agent views, configuration and the error enums
//! used across the workspace.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod agent;
pub mod config;
pub mod error;
pub mod message;
pub mod role;
