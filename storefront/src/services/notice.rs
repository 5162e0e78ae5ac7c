//! User-facing notices (toasts)
//!
//! Every failed operation is published here in addition to being returned
//! as a typed error, so a UI layer can subscribe without wrapping calls.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::ErrorCode;
use tokio::sync::broadcast;

/// Notice channel capacity
const NOTICE_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// One user-facing message
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub code: ErrorCode,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Broadcasts notices to any number of subscribers
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notice>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub fn publish(&self, level: NoticeLevel, code: ErrorCode, message: impl Into<String>) {
        let notice = Notice {
            level,
            code,
            message: message.into(),
            at: Utc::now(),
        };
        // 无订阅者时丢弃
        let _ = self.tx.send(notice);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(NoticeLevel::Success, ErrorCode::Success, message);
    }

    pub fn warning(&self, code: ErrorCode, message: impl Into<String>) {
        self.publish(NoticeLevel::Warning, code, message);
    }

    pub fn error(&self, code: ErrorCode, message: impl Into<String>) {
        self.publish(NoticeLevel::Error, code, message);
    }
}
