//! The two interceptor stages every call passes through.
//!
//! The outbound stage attaches the bearer credential. The inbound stage turns
//! a transport result into either a `ServerEnvelope` or a `GatewayError`,
//! notifying the user about every failure and sending expired sessions to the
//! sign-in page.

use log::{debug, warn};
use reqwest::header::{AUTHORIZATION, HeaderValue};

use super::envelope::{
    SUCCESS_CODE, ServerEnvelope, is_loose_success, is_strict_success, message_or_default,
};
use crate::auth::{CredentialStore, resolve_credential};
use crate::config::{GatewayConfig, mask};
use crate::error::{GatewayError, TransportFailure};
use crate::http::{RequestDescriptor, TransportResponse};
use crate::navigate::Navigator;
use crate::notify::{Notification, Notifier};

/// Attaches `Authorization: Bearer <token>` when a credential is available.
pub struct OutboundStage<S: CredentialStore> {
    store: S,
    fallback: Option<String>,
}

impl<S: CredentialStore> OutboundStage<S> {
    pub fn new(store: S, fallback: Option<String>) -> Self {
        Self { store, fallback }
    }

    /// An error raised before this stage is passed through as-is.
    pub fn apply(
        &self,
        request: Result<RequestDescriptor, GatewayError>,
    ) -> Result<RequestDescriptor, GatewayError> {
        let mut request = request?;

        match resolve_credential(&self.store, self.fallback.as_deref()) {
            Some(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| GatewayError::Request(format!("invalid credential: {}", e)))?;
                value.set_sensitive(true);
                request.headers.insert(AUTHORIZATION, value);
                debug!("Authorizing {} with {}", request.url, mask(&token));
            }
            None => debug!("No credential available, sending {} anonymously", request.url),
        }

        Ok(request)
    }
}

/// Classifies responses and failures.
pub struct InboundStage<N: Notifier, V: Navigator> {
    notifier: N,
    navigator: V,
    sign_in_url: String,
    auth_failure_marker: String,
    duration_ms: u64,
}

impl<N: Notifier, V: Navigator> InboundStage<N, V> {
    pub fn new(config: &GatewayConfig, notifier: N, navigator: V) -> Self {
        Self {
            notifier,
            navigator,
            sign_in_url: config.sign_in_url.clone(),
            auth_failure_marker: config.auth_failure_marker.clone(),
            duration_ms: config.notification_duration_ms,
        }
    }

    /// Success path: the transport returned a 2xx.
    pub fn on_success(&self, response: TransportResponse) -> Result<ServerEnvelope, GatewayError> {
        let body = response.body;

        if !is_strict_success(&body) {
            let message = message_or_default(&body);
            warn!("Request rejected by server: {}", message);
            self.notifier
                .notify(Notification::error(message.clone(), self.duration_ms));
            return Err(GatewayError::Application {
                code: body.get("code").and_then(|c| c.as_i64()),
                message,
            });
        }

        // Second pass over the same fields with loose equality. Only the
        // severity of the notification differs from the check above.
        if !is_loose_success(body.get("code")) {
            let message = message_or_default(&body);
            warn!("Request rejected by server: {}", message);
            self.notifier
                .notify(Notification::warning(message.clone(), self.duration_ms));
            return Err(GatewayError::Application {
                code: body.get("code").and_then(|c| c.as_i64()),
                message,
            });
        }

        Ok(ServerEnvelope::from_parts(SUCCESS_CODE, body))
    }

    /// Failure path: non-2xx status, timeout or network failure. Always
    /// returns the error the caller should see.
    pub fn on_failure(&self, failure: TransportFailure) -> GatewayError {
        let text = failure
            .server_message()
            .unwrap_or(&failure.message)
            .to_string();
        warn!(
            "Request failed (status {:?}): {}",
            failure.status, failure.message
        );
        self.notifier
            .notify(Notification::error(text, self.duration_ms));

        if failure.status == Some(401)
            && failure.server_err_message() == Some(self.auth_failure_marker.as_str())
        {
            self.navigator.redirect(&self.sign_in_url);
            return GatewayError::AuthExpired(failure);
        }

        GatewayError::Transport(failure)
    }
}
