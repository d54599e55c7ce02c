//! Log entry model shared by the debug and UI loggers
//!
//! Every event that enters the pipeline is normalized into a [`LogEntry`].
//! Entries serialize with the same camelCase field names the host expects
//! for its `DebugLogEntry` records.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::backtrace::Backtrace;
use std::fmt;

/// Structured payload attached to an entry. Opaque to the pipeline.
pub type Payload = Map<String, Value>;

/// Severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    #[serde(alias = "debug")]
    Debug,
    #[serde(alias = "info")]
    Info,
    #[serde(alias = "warn")]
    Warn,
    #[serde(alias = "error")]
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an event originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    #[default]
    Frontend,
    Backend,
    System,
}

impl LogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogSource::Frontend => "frontend",
            LogSource::Backend => "backend",
            LogSource::System => "system",
        }
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action tag carried by UI-interaction entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiAction {
    Open,
    Close,
    Mount,
    Unmount,
    Click,
    Change,
    Error,
}

impl UiAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            UiAction::Open => "open",
            UiAction::Close => "close",
            UiAction::Mount => "mount",
            UiAction::Unmount => "unmount",
            UiAction::Click => "click",
            UiAction::Change => "change",
            UiAction::Error => "error",
        }
    }
}

impl fmt::Display for UiAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message and stack extracted from a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub message: String,
    pub stack: String,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: stack.into(),
        }
    }

    /// Capture an error's message, its `source()` chain and the current backtrace
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let message = err.to_string();
        let mut stack = format!("{message}\n");

        let mut source = err.source();
        while let Some(cause) = source {
            stack.push_str(&format!("Caused by: {cause}\n"));
            source = cause.source();
        }

        stack.push_str(&Backtrace::force_capture().to_string());

        Self { message, stack }
    }

    /// Build from a bare message, capturing the current backtrace as the stack
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let stack = format!("{message}\n{}", Backtrace::force_capture());
        Self { message, stack }
    }
}

impl<E: std::error::Error + 'static> From<&E> for ErrorInfo {
    fn from(err: &E) -> Self {
        Self::from_error(err)
    }
}

/// One normalized log record
///
/// `seq` is stamped by the ring store on insertion and is the authoritative
/// ordering: timestamps may collide, sequence numbers never do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(default)]
    pub seq: u64,
    pub timestamp: i64,
    pub level: LogLevel,
    pub source: LogSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub component: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Payload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl LogEntry {
    pub fn new(
        level: LogLevel,
        source: LogSource,
        component: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            seq: 0,
            timestamp: Utc::now().timestamp_millis(),
            level,
            source,
            feature: None,
            action: None,
            component: component.into(),
            message: message.into(),
            data: None,
            error: None,
            stack: None,
        }
    }

    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = Some(feature.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_data(mut self, data: Option<Payload>) -> Self {
        self.data = data.filter(|map| !map.is_empty());
        self
    }

    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error.message);
        self.stack = Some(error.stack);
        self
    }

    /// RFC 3339 rendering of `timestamp` with millisecond precision
    pub fn iso_timestamp(&self) -> String {
        DateTime::<Utc>::from_timestamp_millis(self.timestamp)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_else(|| self.timestamp.to_string())
    }
}

/// Normalize an arbitrary JSON value into an entry payload.
///
/// Objects are used as-is, `null` means no payload, anything else is wrapped
/// under a `value` key.
pub fn payload_from_value(value: Value) -> Option<Payload> {
    match value {
        Value::Null => None,
        Value::Object(map) => Some(map),
        other => {
            let mut map = Payload::new();
            map.insert("value".to_string(), other);
            Some(map)
        }
    }
}
