//! HTTP/REST API layer for rolechat.
//!
//! Axum router under `/api` with JSON errors, open CORS and an SSE chat
//! endpoint.

pub mod error;
pub mod handlers;
pub mod router;
