use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use tracing::error;

/// One structured error log entry.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub timestamp: DateTime<Utc>,
    pub context: String,
    pub message: String,
    /// Messages of the error's source chain, outermost first.
    pub stack: Vec<String>,
    pub extra: Value,
}

/// Log an error with its context and return the record that was emitted.
pub fn log_error(context: &str, err: &(dyn Error + 'static), extra: Value) -> ErrorRecord {
    let mut stack = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        stack.push(cause.to_string());
        source = cause.source();
    }

    let record = ErrorRecord {
        timestamp: Utc::now(),
        context: context.to_string(),
        message: err.to_string(),
        stack,
        extra,
    };

    error!(
        timestamp = %record.timestamp.to_rfc3339(),
        context = %record.context,
        stack = ?record.stack,
        extra = %record.extra,
        "{}",
        record.message
    );

    record
}
