use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::Utc;
use serde::Serialize;

use crate::{domain::Direction, Result};

// ============== Timestamp Helpers ==============

/// RFC3339 timestamp in UTC (for logs).
pub fn iso_timestamp_utc() -> String {
    Utc::now().to_rfc3339()
}

// ============== Message Log ==============

const LOG_MAX_TEXT: usize = 500;

/// One relayed message.
#[derive(Clone, Debug, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub from_user: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_user: Option<i64>,
    pub direction: Direction,
    pub content: String,
}

impl LogEntry {
    pub fn new(from_user: i64, to_user: Option<i64>, direction: Direction, content: &str) -> Self {
        Self {
            timestamp: iso_timestamp_utc(),
            from_user,
            to_user,
            direction,
            content: content.to_string(),
        }
    }
}

/// Append-only JSON-lines log of everything the bot relays.
#[derive(Debug)]
pub struct MessageLog {
    path: Option<PathBuf>,
    write_lock: Mutex<()>,
}

impl MessageLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            write_lock: Mutex::new(()),
        }
    }

    /// Log that drops every entry.
    pub fn disabled() -> Self {
        Self {
            path: None,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn write(&self, mut entry: LogEntry) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        entry.content = truncate_text(&entry.content, LOG_MAX_TEXT);
        let line = serde_json::to_string(&entry)?;

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Best-effort write; failures only reach the tracing log.
    pub fn record(
        &self,
        from_user: i64,
        to_user: Option<i64>,
        direction: Direction,
        content: &str,
    ) {
        if let Err(e) = self.write(LogEntry::new(from_user, to_user, direction, content)) {
            tracing::warn!(error = %e, "failed to write message log");
        }
    }
}

pub fn truncate_text(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
