//! Observability setup for rpaflow binaries.
//!
//! - `tracing_setup` -- subscriber installation and OpenTelemetry bridging

pub mod tracing_setup;
