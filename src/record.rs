use crate::level::Level;
use crate::value::FieldValue;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Call site captured by the front-end when caller reporting is enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerFrame {
    pub function: String,
    pub file: String,
    pub line: u32,
}

/// A single log event as handed to the [`Formatter`](crate::formatter::Formatter).
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub caller: Option<CallerFrame>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl LogRecord {
    /// Record stamped with the current time, no caller and no fields.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        LogRecord {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            caller: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_caller(mut self, caller: CallerFrame) -> Self {
        self.caller = Some(caller);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
