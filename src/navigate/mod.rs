//! Hard navigation away from the current session.

use log::warn;
use std::sync::atomic::{AtomicBool, Ordering};

/// Full-page redirect. Whatever state the caller holds is abandoned once this
/// fires.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    fn redirect(&self, url: &str);
}

/// Sends the user to the sign-in page by printing the URL on stderr, and
/// remembers that the session has been abandoned.
#[derive(Debug, Default)]
pub struct ConsoleNavigator {
    abandoned: AtomicBool,
}

impl ConsoleNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a redirect has happened during this process.
    pub fn session_abandoned(&self) -> bool {
        self.abandoned.load(Ordering::SeqCst)
    }
}

impl Navigator for ConsoleNavigator {
    fn redirect(&self, url: &str) {
        warn!("Session expired, redirecting to {}", url);
        eprintln!("Please sign in again: {}", url);
        self.abandoned.store(true, Ordering::SeqCst);
    }
}
