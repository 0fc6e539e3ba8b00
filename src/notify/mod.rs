//! User-facing notifications emitted by the gateway.

use log::{error, warn};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A transient message for the user. It has no identity and is handed to the
/// notifier exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    pub severity: Severity,
    pub duration_ms: u64,
}

impl Notification {
    pub fn error(text: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Error,
            duration_ms,
        }
    }

    pub fn warning(text: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Warning,
            duration_ms,
        }
    }
}

/// Fire-and-forget presentation of notifications.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Renders notifications through the log, at the level matching severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Error => error!("{}", notification.text),
            Severity::Warning => warn!("{}", notification.text),
        }
    }
}
