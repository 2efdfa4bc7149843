//! Telemetry
//!
//! Structured logging for token flows.

pub mod logging;

pub use logging::{
    InMemoryLogger, LogEntry, LogLevel, Logger, NoOpLogger, TokenFlowLogContext, TracingLogger,
};
