//! Business logic and port definitions for rolechat.
//!
//! This crate defines the "ports" (repository and upstream client traits)
//! that the infrastructure layer implements, plus the role service and the
//! chat stream relay. It depends only on `rolechat-types` -- never on
//! `rolechat-infra` or any database/HTTP crate.

pub mod chat;
pub mod repository;
pub mod service;
pub mod upstream;
