use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Structured transcript event types for a data-entry session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LogEventType {
    SessionStart,
    WalkStart,
    FieldAnswered,
    ArrayFinalized,
    Confirmation,
    SessionRestart,
    SessionSubmitted,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

/// A single transcript entry, serialized as one JSON line.
///
/// Entries name field paths and counts only; collected values are never logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: String,
    pub event_type: LogEventType,
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl LogEvent {
    pub fn new(
        event_type: LogEventType,
        level: LogLevel,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            event_type,
            level,
            message: message.into(),
            details,
        }
    }

    pub fn info_with_details(
        event_type: LogEventType,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self::new(event_type, LogLevel::Info, message, Some(details))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogEventType::Error, LogLevel::Error, message, None)
    }
}

/// Writes a JSONL transcript for one session: `<dir>/<session_id>.jsonl`.
pub struct SessionLogger {
    session_id: String,
    log_file_path: PathBuf,
}

impl SessionLogger {
    /// Creates the transcript directory if needed and assigns a fresh session id.
    pub async fn new(dir: &Path) -> Result<Self> {
        Self::with_session_id(dir, uuid::Uuid::new_v4().to_string()).await
    }

    pub async fn with_session_id(dir: &Path, session_id: String) -> Result<Self> {
        tokio::fs::create_dir_all(dir)
            .await
            .context("Failed to create transcript directory")?;
        let log_file_path = dir.join(format!("{session_id}.jsonl"));
        Ok(Self {
            session_id,
            log_file_path,
        })
    }

    /// Appends one event; each call opens, appends and flushes.
    pub async fn log(&self, event: LogEvent) -> Result<()> {
        let mut line = serde_json::to_string(&event).context("Failed to serialize log event")?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)
            .await
            .context("Failed to open transcript file")?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    pub async fn log_session_start(&self, root_kind: &str, require_confirmation: bool) -> Result<()> {
        self.log(LogEvent::info_with_details(
            LogEventType::SessionStart,
            format!("Session {} started", self.session_id),
            serde_json::json!({
                "session_id": self.session_id,
                "root_kind": root_kind,
                "require_confirmation": require_confirmation,
            }),
        ))
        .await
    }

    pub async fn log_walk_start(&self, attempt: usize) -> Result<()> {
        self.log(LogEvent::info_with_details(
            LogEventType::WalkStart,
            format!("Walk attempt {attempt}"),
            serde_json::json!({ "attempt": attempt }),
        ))
        .await
    }

    pub async fn log_confirmation(&self, attempt: usize, accepted: bool) -> Result<()> {
        let event_type = if accepted {
            LogEventType::Confirmation
        } else {
            LogEventType::SessionRestart
        };
        self.log(LogEvent::info_with_details(
            event_type,
            if accepted {
                format!("Attempt {attempt} confirmed")
            } else {
                format!("Attempt {attempt} rejected, restarting")
            },
            serde_json::json!({ "attempt": attempt, "accepted": accepted }),
        ))
        .await
    }

    pub async fn log_submitted(&self, attempts: usize) -> Result<()> {
        self.log(LogEvent::info_with_details(
            LogEventType::SessionSubmitted,
            format!("Session submitted after {attempts} walk(s)"),
            serde_json::json!({ "attempts": attempts }),
        ))
        .await
    }

    pub async fn log_error(&self, message: &str) -> Result<()> {
        self.log(LogEvent::error(message)).await
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn log_file_path(&self) -> &Path {
        &self.log_file_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_logger_creates_transcript() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("transcripts");

        let logger = SessionLogger::with_session_id(&dir, "s-1".to_string())
            .await
            .unwrap();
        logger.log_session_start("record", true).await.unwrap();
        logger.log_walk_start(1).await.unwrap();
        logger.log_confirmation(1, false).await.unwrap();
        logger.log_walk_start(2).await.unwrap();
        logger.log_confirmation(2, true).await.unwrap();
        logger.log_submitted(2).await.unwrap();

        assert_eq!(logger.log_file_path(), dir.join("s-1.jsonl"));
        let content = tokio::fs::read_to_string(logger.log_file_path()).await.unwrap();
        let events: Vec<LogEvent> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(events.len(), 6);
        assert_eq!(events[0].event_type, LogEventType::SessionStart);
        assert_eq!(events[2].event_type, LogEventType::SessionRestart);
        assert_eq!(events[4].event_type, LogEventType::Confirmation);
        assert_eq!(events[5].details.as_ref().unwrap()["attempts"], 2);
    }

    #[tokio::test]
    async fn test_logger_append_mode() {
        let tmp = tempdir().unwrap();
        let first = SessionLogger::with_session_id(tmp.path(), "same".to_string())
            .await
            .unwrap();
        first.log_walk_start(1).await.unwrap();

        let second = SessionLogger::with_session_id(tmp.path(), "same".to_string())
            .await
            .unwrap();
        second.log_error("Second").await.unwrap();

        let content = tokio::fs::read_to_string(first.log_file_path()).await.unwrap();
        assert_eq!(content.lines().count(), 2, "Should append, not overwrite");
    }

    #[tokio::test]
    async fn test_fresh_session_ids() {
        let tmp = tempdir().unwrap();
        let a = SessionLogger::new(tmp.path()).await.unwrap();
        let b = SessionLogger::new(tmp.path()).await.unwrap();
        assert_ne!(a.session_id(), b.session_id());
    }
}
