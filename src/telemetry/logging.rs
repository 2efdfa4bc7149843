//! Logging
//!
//! Structured logging for token flows. Secrets and token values are never
//! part of a log context.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::GrantType;

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Token flow log context.
#[derive(Debug, Clone, Default)]
pub struct TokenFlowLogContext {
    /// Grant type of the flow.
    pub grant_type: Option<GrantType>,
    /// Client ID.
    pub client_id: Option<String>,
    /// Token endpoint, without query.
    pub endpoint: Option<String>,
    /// Additional context.
    pub extra: BTreeMap<String, String>,
}

impl TokenFlowLogContext {
    /// Create new log context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set grant type.
    pub fn grant_type(mut self, grant_type: GrantType) -> Self {
        self.grant_type = Some(grant_type);
        self
    }

    /// Set client ID.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Add extra context.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    fn extra_fields(&self) -> String {
        self.extra
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Logger interface.
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str, context: &TokenFlowLogContext);

    /// Check if a log level is enabled.
    fn is_enabled(&self, level: LogLevel) -> bool;

    fn debug(&self, message: &str, context: &TokenFlowLogContext) {
        self.log(LogLevel::Debug, message, context);
    }

    fn info(&self, message: &str, context: &TokenFlowLogContext) {
        self.log(LogLevel::Info, message, context);
    }

    fn warn(&self, message: &str, context: &TokenFlowLogContext) {
        self.log(LogLevel::Warn, message, context);
    }

    fn error(&self, message: &str, context: &TokenFlowLogContext) {
        self.log(LogLevel::Error, message, context);
    }
}

/// Logger emitting `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

macro_rules! emit {
    ($level:expr, $message:expr, $ctx:expr) => {{
        let grant_type = $ctx.grant_type.map(|g| g.as_str()).unwrap_or("");
        let client_id = $ctx.client_id.as_deref().unwrap_or("");
        let endpoint = $ctx.endpoint.as_deref().unwrap_or("");
        let extra = $ctx.extra_fields();
        tracing::event!(
            target: "xsuaa_token_flows",
            $level,
            grant_type,
            client_id,
            endpoint,
            extra = %extra,
            "{}",
            $message
        );
    }};
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str, context: &TokenFlowLogContext) {
        match level {
            LogLevel::Trace => emit!(tracing::Level::TRACE, message, context),
            LogLevel::Debug => emit!(tracing::Level::DEBUG, message, context),
            LogLevel::Info => emit!(tracing::Level::INFO, message, context),
            LogLevel::Warn => emit!(tracing::Level::WARN, message, context),
            LogLevel::Error => emit!(tracing::Level::ERROR, message, context),
        }
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        match level {
            LogLevel::Trace => tracing::enabled!(tracing::Level::TRACE),
            LogLevel::Debug => tracing::enabled!(tracing::Level::DEBUG),
            LogLevel::Info => tracing::enabled!(tracing::Level::INFO),
            LogLevel::Warn => tracing::enabled!(tracing::Level::WARN),
            LogLevel::Error => tracing::enabled!(tracing::Level::ERROR),
        }
    }
}

/// No-op logger implementation.
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn log(&self, _level: LogLevel, _message: &str, _context: &TokenFlowLogContext) {}

    fn is_enabled(&self, _level: LogLevel) -> bool {
        false
    }
}

/// Log entry for in-memory storage.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub context: TokenFlowLogContext,
    pub timestamp: u64,
}

/// In-memory logger for testing.
pub struct InMemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
    min_level: LogLevel,
}

impl InMemoryLogger {
    /// Create new in-memory logger.
    pub fn new() -> Self {
        Self::with_level(LogLevel::Trace)
    }

    /// Create in-memory logger with minimum level.
    pub fn with_level(min_level: LogLevel) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            min_level,
        }
    }

    /// Get all log entries.
    pub fn get_entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Get entries by level.
    pub fn get_entries_by_level(&self, level: LogLevel) -> Vec<LogEntry> {
        self.get_entries()
            .into_iter()
            .filter(|e| e.level == level)
            .collect()
    }
}

impl Default for InMemoryLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for InMemoryLogger {
    fn log(&self, level: LogLevel, message: &str, context: &TokenFlowLogContext) {
        if !self.is_enabled(level) {
            return;
        }

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LogEntry {
                level,
                message: message.to_string(),
                context: context.clone(),
                timestamp: now,
            });
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }
}
