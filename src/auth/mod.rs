//! Credential lookup for outbound requests.

use log::{debug, warn};
use std::path::PathBuf;

use crate::config::mask;
use crate::runtime::Runtime;

/// Read-only source of the signed-in user's bearer token.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialStore: Send + Sync {
    fn get_token(&self) -> Option<String>;
}

/// Credential store backed by a single token file.
pub struct FileTokenStore<R: Runtime> {
    runtime: R,
    path: Option<PathBuf>,
}

impl<R: Runtime> FileTokenStore<R> {
    pub fn new(runtime: R, path: Option<PathBuf>) -> Self {
        Self { runtime, path }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

impl<R: Runtime> CredentialStore for FileTokenStore<R> {
    #[tracing::instrument(skip(self))]
    fn get_token(&self) -> Option<String> {
        let path = self.path.as_ref()?;
        if !self.runtime.exists(path) {
            debug!("No stored credential at {}", path.display());
            return None;
        }

        match self.runtime.read_to_string(path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    None
                } else {
                    debug!("Loaded stored credential {}", mask(token));
                    Some(token.to_string())
                }
            }
            Err(e) => {
                warn!("Ignoring unreadable credential file: {:#}", e);
                None
            }
        }
    }
}

/// Picks the bearer token for a request: the stored credential first, then
/// the configured fallback. `None` means the request goes out unauthenticated.
pub fn resolve_credential<S: CredentialStore + ?Sized>(
    store: &S,
    fallback: Option<&str>,
) -> Option<String> {
    store
        .get_token()
        .or_else(|| fallback.map(str::to_string))
}
