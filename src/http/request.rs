//! Request descriptors and body encoding.

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;

use crate::error::GatewayError;

/// Ordered query parameters.
pub type QueryParams = Vec<(String, String)>;

/// Rewrites a body before it is sent. Transforms run in list order.
pub type BodyTransform = fn(Payload) -> Result<Payload, GatewayError>;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A request body before it is turned into bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
    Bytes(Vec<u8>),
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Bytes(bytes)
    }
}

/// How the response body is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Json,
    Text,
}

/// Everything needed to issue one call. Built fresh by each entry point.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub url: String,
    pub method: Method,
    pub params: Option<QueryParams>,
    pub body: Option<Payload>,
    pub headers: HeaderMap,
    pub response_format: ResponseFormat,
    pub transforms: Vec<BodyTransform>,
}

impl RequestDescriptor {
    pub fn new(url: impl Into<String>, method: Method) -> Self {
        Self {
            url: url.into(),
            method,
            params: None,
            body: None,
            headers: HeaderMap::new(),
            response_format: ResponseFormat::default(),
            transforms: Vec::new(),
        }
    }

    /// Runs the body through the transform list and serializes it.
    ///
    /// JSON bodies, and any body on a POST, default to `application/json`
    /// unless a content type was set explicitly. A request without a body
    /// gets no content type.
    pub fn encode(self) -> Result<OutboundRequest, GatewayError> {
        let mut headers = self.headers;

        let body = match self.body {
            Some(body) => {
                let body = self
                    .transforms
                    .iter()
                    .try_fold(body, |body, transform| transform(body))?;
                Some(body)
            }
            None => None,
        };

        let default_json = match &body {
            Some(Payload::Json(_)) => true,
            Some(_) => self.method == Method::POST,
            None => false,
        };
        if default_json && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        }

        let body = match body {
            Some(Payload::Json(value)) => Some(
                serde_json::to_vec(&value)
                    .map_err(|e| GatewayError::Request(format!("unencodable JSON body: {}", e)))?,
            ),
            Some(Payload::Text(text)) => Some(text.into_bytes()),
            Some(Payload::Bytes(bytes)) => Some(bytes),
            None => None,
        };

        Ok(OutboundRequest {
            method: self.method,
            url: self.url,
            query: self.params.unwrap_or_default(),
            headers,
            body,
            response_format: self.response_format,
        })
    }
}

/// A fully encoded request, ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub query: QueryParams,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    pub response_format: ResponseFormat,
}

impl OutboundRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Serializes a key/value mapping as `k=v&k=v&`, percent-encoding keys and
/// values. Every pair is followed by `&`, including the last one. Bodies that
/// are already text or bytes pass through untouched.
pub fn form_urlencode(payload: Payload) -> Result<Payload, GatewayError> {
    let map = match payload {
        Payload::Json(Value::Object(map)) => map,
        Payload::Json(Value::Null) => return Ok(Payload::Text(String::new())),
        Payload::Json(other) => {
            return Err(GatewayError::Request(format!(
                "form body must be a key/value mapping, got {}",
                other
            )));
        }
        passthrough => return Ok(passthrough),
    };

    let mut encoded = String::new();
    for (key, value) in &map {
        encoded.push_str(&urlencoding::encode(key));
        encoded.push('=');
        encoded.push_str(&urlencoding::encode(&form_value(value)));
        encoded.push('&');
    }
    Ok(Payload::Text(encoded))
}

fn form_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(form_value)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}
