//! Per-day run log.
//!
//! Each business day accumulates its own log lines next to its results and
//! exports them with the daily artifacts. Lines are mirrored to `tracing`.

use chrono::{DateTime, Utc};
use dacc_core::HourPosition;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLine {
    pub at: DateTime<Utc>,
    pub level: LogLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<HourPosition>,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunLog {
    lines: Vec<LogLine>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, position: Option<HourPosition>, message: impl Into<String>) {
        let message = message.into();
        info!(hour = ?position.map(|p| p.value()), "{message}");
        self.push(LogLevel::Info, position, message);
    }

    pub fn warn(&mut self, position: Option<HourPosition>, message: impl Into<String>) {
        let message = message.into();
        warn!(hour = ?position.map(|p| p.value()), "{message}");
        self.push(LogLevel::Warn, position, message);
    }

    pub fn error(&mut self, position: Option<HourPosition>, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(hour = ?position.map(|p| p.value()), "{message}");
        self.push(LogLevel::Error, position, message);
    }

    fn push(&mut self, level: LogLevel, position: Option<HourPosition>, message: String) {
        self.lines.push(LogLine {
            at: Utc::now(),
            level,
            position,
            message,
        });
    }

    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_keep_order_and_level() {
        let mut log = RunLog::new();
        let hour = HourPosition::new(3).unwrap();
        log.info(None, "dispatching day");
        log.warn(Some(hour), "duplicate completion ignored");
        assert_eq!(log.len(), 2);
        assert_eq!(log.lines()[1].level, LogLevel::Warn);
        assert_eq!(log.lines()[1].position, Some(hour));
    }

    #[test]
    fn serializes_as_plain_array() {
        let mut log = RunLog::new();
        log.error(None, "engine unreachable");
        let json = serde_json::to_value(&log).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["level"], "error");
    }
}
