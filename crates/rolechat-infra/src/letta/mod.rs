//! Letta agent provider adapter.

pub mod client;
pub mod types;

pub use client::LettaAgentClient;
