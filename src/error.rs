//! Errors surfaced by the gateway.

use serde_json::Value;

/// A request that failed at the transport level: a non-2xx status, a timeout
/// or a network failure.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportFailure {
    /// HTTP status, absent when no response arrived at all.
    pub status: Option<u16>,
    /// The transport's own description of the failure.
    pub message: String,
    /// Decoded response body, if the server sent one.
    pub body: Option<Value>,
}

impl TransportFailure {
    pub fn status(status: u16, body: Option<Value>) -> Self {
        Self {
            status: Some(status),
            message: format!("Request failed with status code {}", status),
            body,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            body: None,
        }
    }

    /// `message` field of the server's error body, when non-empty.
    pub fn server_message(&self) -> Option<&str> {
        self.body_str("message")
    }

    /// `errMessage` field of the server's error body.
    pub fn server_err_message(&self) -> Option<&str> {
        self.body_str("errMessage")
    }

    fn body_str(&self, key: &str) -> Option<&str> {
        self.body
            .as_ref()?
            .get(key)?
            .as_str()
            .filter(|s| !s.is_empty())
    }
}

impl std::fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TransportFailure {}

/// Why a gateway call was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// The server answered but its envelope code was not 200.
    Application { code: Option<i64>, message: String },
    /// The request failed before an envelope could be read.
    Transport(TransportFailure),
    /// A 401 carrying the authentication-failure marker. The user has been
    /// sent to the sign-in page.
    AuthExpired(TransportFailure),
    /// The request could not be built or encoded; nothing was sent.
    Request(String),
}

impl GatewayError {
    /// The underlying transport failure, for transport-level rejections.
    pub fn transport(&self) -> Option<&TransportFailure> {
        match self {
            GatewayError::Transport(failure) | GatewayError::AuthExpired(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, GatewayError::AuthExpired(_))
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayError::Application { message, .. } => write!(f, "{}", message),
            GatewayError::Transport(failure) => write!(f, "{}", failure),
            GatewayError::AuthExpired(failure) => write!(f, "{}", failure),
            GatewayError::Request(msg) => write!(f, "Invalid request: {}", msg),
        }
    }
}

impl std::error::Error for GatewayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GatewayError::Transport(failure) | GatewayError::AuthExpired(failure) => Some(failure),
            _ => None,
        }
    }
}
