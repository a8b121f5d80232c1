//! Thesaurus Telemetry - Logging Infrastructure
//!
//! Structured logging via `tracing`, filtered by `RUST_LOG`.

pub mod tracer;

pub use tracer::{init_tracer, TelemetryConfig};
