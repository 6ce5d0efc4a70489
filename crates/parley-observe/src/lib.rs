//! Observability setup for Parley: structured logging and optional
//! OpenTelemetry trace export.

pub mod tracing_setup;
