//! Infrastructure layer for rolechat.
//!
//! Contains implementations of the ports defined in `rolechat-core`:
//! SQLite and in-memory storage, the Letta upstream agent client, and the
//! configuration loader.

pub mod config;
pub mod letta;
pub mod memory;
pub mod sqlite;
