//! rolechat application layer: shared state and the HTTP API.
//!
//! The `rolechat` binary in `main.rs` adds the CLI on top.

pub mod http;
pub mod state;
