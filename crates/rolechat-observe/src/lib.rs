//! Observability setup for rolechat: structured logging and optional
//! OpenTelemetry span export.

pub mod tracing_setup;
