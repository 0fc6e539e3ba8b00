//! Outbound HTTP gateway for the learning portal API.
//!
//! Every call goes through [`gateway::ApiGateway`], which attaches the bearer
//! credential, encodes the body for one of three shapes (JSON, URL-encoded
//! form, multipart upload) and classifies the server's answer. Failures are
//! shown to the user through a [`notify::Notifier`] and returned to the
//! caller; an expired session additionally triggers a redirect through a
//! [`navigate::Navigator`].

pub mod auth;
pub mod commands;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod navigate;
pub mod notify;
pub mod runtime;

pub use error::{GatewayError, TransportFailure};
pub use gateway::{ApiGateway, ServerEnvelope};
