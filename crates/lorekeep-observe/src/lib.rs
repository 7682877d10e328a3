//! Observability setup for Lorekeep.

pub mod tracing_setup;
