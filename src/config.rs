//! Gateway configuration, fixed at construction.

use anyhow::{Context, Result};
use log::debug;
use std::path::PathBuf;
use std::time::Duration;

use crate::runtime::Runtime;

/// Path prefix prepended to every request URL.
pub const API_PREFIX: &str = "/api";

/// Per-request timeout enforced by the transport.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(25);

/// How long a notification stays on screen.
pub const NOTIFICATION_DURATION_MS: u64 = 5000;

/// Where an expired session is sent to sign in again.
pub const SIGN_IN_URL: &str = "http://www.51xuecheng.cn/sign.html";

/// `errMessage` value the server sends with a 401 when the session is gone.
pub const AUTH_FAILURE_MARKER: &str = "没有认证";

/// Server origin used when nothing else is configured.
pub const DEFAULT_ORIGIN: &str = "http://localhost:8601";

pub const ORIGIN_ENV: &str = "PORTAL_API_ORIGIN";
pub const FALLBACK_TOKEN_ENV: &str = "PORTAL_SERVER_AUTHORIZATION";

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// Scheme and authority of the server, without the `/api` prefix.
    pub origin: String,
    pub timeout: Duration,
    /// Bearer token used when the credential store has none.
    pub fallback_token: Option<String>,
    pub sign_in_url: String,
    pub auth_failure_marker: String,
    pub notification_duration_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            timeout: REQUEST_TIMEOUT,
            fallback_token: None,
            sign_in_url: SIGN_IN_URL.to_string(),
            auth_failure_marker: AUTH_FAILURE_MARKER.to_string(),
            notification_duration_ms: NOTIFICATION_DURATION_MS,
        }
    }
}

impl GatewayConfig {
    /// Builds the configuration from the environment. An explicit `origin`
    /// wins over `PORTAL_API_ORIGIN`.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, origin: Option<String>) -> Result<Self> {
        let origin = match origin {
            Some(origin) => origin,
            None => runtime
                .env_var(ORIGIN_ENV)
                .unwrap_or_else(|_| DEFAULT_ORIGIN.to_string()),
        };
        let origin = normalize_origin(&origin)?;

        let fallback_token = runtime
            .env_var(FALLBACK_TOKEN_ENV)
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        if let Some(token) = &fallback_token {
            debug!("Using {} as fallback credential: {}", FALLBACK_TOKEN_ENV, mask(token));
        }

        Ok(Self {
            origin,
            fallback_token,
            ..Self::default()
        })
    }

    /// Full base URL: origin followed by the API prefix.
    pub fn base_url(&self) -> String {
        format!("{}{}", self.origin, API_PREFIX)
    }
}

/// Default location of the stored credential.
pub fn default_token_path<R: Runtime>(runtime: &R) -> Option<PathBuf> {
    runtime
        .config_dir()
        .map(|dir| dir.join("portal-api").join("token"))
}

fn normalize_origin(origin: &str) -> Result<String> {
    let origin = origin.trim().trim_end_matches('/');
    let parsed = reqwest::Url::parse(origin)
        .with_context(|| format!("Invalid server origin '{}'", origin))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("Server origin must use http or https, got '{}'", origin);
    }
    Ok(origin.to_string())
}

/// Shortens a secret to its first and last four characters for logging.
pub(crate) fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*********".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}
