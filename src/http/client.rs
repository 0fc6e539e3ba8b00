//! Transport that executes encoded requests over HTTP.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::request::{OutboundRequest, ResponseFormat};
use crate::error::TransportFailure;

/// A response with a 2xx status.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one request. Non-2xx statuses, timeouts and network errors all
    /// come back as a `TransportFailure`.
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, TransportFailure>;
}

/// Shared HTTP transport with a fixed base URL and timeout.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
        }
    }

    /// Builds the underlying reqwest client with the given timeout.
    pub fn build(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("portal-api/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self::new(client, base_url, timeout))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolves a request URL against the base URL. Absolute URLs are used
    /// as-is.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        if url.is_empty() {
            return self.base_url.clone();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[tracing::instrument(
        skip(self, request),
        fields(method = %request.method, url = %request.url)
    )]
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, TransportFailure> {
        let url = self.resolve_url(&request.url);
        debug!("{} {}...", request.method, url);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(request.headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.network_failure(e, "Network Error"))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.network_failure(e, "Failed to read response body"))?;
        let body = decode_body(&bytes, request.response_format);

        debug!("{} {} -> {}", request.method, url, status.as_u16());

        if status.is_success() {
            Ok(TransportResponse {
                status: status.as_u16(),
                body: body.unwrap_or(Value::Null),
            })
        } else {
            Err(TransportFailure::status(status.as_u16(), body))
        }
    }
}

impl HttpTransport {
    /// Timeouts read `timeout of <N>ms exceeded`; anything else keeps the
    /// reqwest error text after `context`.
    fn network_failure(&self, e: reqwest::Error, context: &str) -> TransportFailure {
        if e.is_timeout() {
            TransportFailure::network(format!(
                "timeout of {}ms exceeded",
                self.timeout.as_millis()
            ))
        } else {
            TransportFailure::network(format!("{}: {}", context, e))
        }
    }
}

/// JSON bodies that fail to parse are kept as text.
fn decode_body(bytes: &[u8], format: ResponseFormat) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }
    let text = || Value::String(String::from_utf8_lossy(bytes).into_owned());
    match format {
        ResponseFormat::Json => Some(serde_json::from_slice(bytes).unwrap_or_else(|_| text())),
        ResponseFormat::Text => Some(text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::RequestDescriptor;
    use mockito::Matcher;
    use reqwest::Method;
    use serde_json::json;

    fn transport(url: &str) -> HttpTransport {
        HttpTransport::build(format!("{}/api", url), Duration::from_secs(25)).unwrap()
    }

    #[test]
    fn test_resolve_url() {
        let t = HttpTransport::new(Client::new(), "http://host/api", Duration::from_secs(1));
        assert_eq!(t.resolve_url("/course/list"), "http://host/api/course/list");
        assert_eq!(t.resolve_url("course/list"), "http://host/api/course/list");
        assert_eq!(t.resolve_url(""), "http://host/api");
        assert_eq!(t.resolve_url("https://cdn.example.com/x"), "https://cdn.example.com/x");
        assert_eq!(t.base_url(), "http://host/api");
    }

    #[tokio::test]
    async fn test_send_success_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/course/list")
            .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code": 200, "data": [1, 2]}"#)
            .create_async()
            .await;

        let mut descriptor = RequestDescriptor::new("/course/list", Method::GET);
        descriptor.params = Some(vec![("page".to_string(), "1".to_string())]);
        let response = transport(&server.url())
            .send(descriptor.encode().unwrap())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({"code": 200, "data": [1, 2]}));
    }

    #[tokio::test]
    async fn test_send_posts_body_and_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/course")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"name": "rust"})))
            .with_status(200)
            .with_body(r#"{"code": 200}"#)
            .create_async()
            .await;

        let mut descriptor = RequestDescriptor::new("/course", Method::POST);
        descriptor.body = Some(json!({"name": "rust"}).into());
        transport(&server.url())
            .send(descriptor.encode().unwrap())
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/secret")
            .with_status(401)
            .with_body(r#"{"errMessage": "没有认证"}"#)
            .create_async()
            .await;

        let failure = transport(&server.url())
            .send(RequestDescriptor::new("/secret", Method::GET).encode().unwrap())
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(failure.status, Some(401));
        assert_eq!(failure.server_err_message(), Some("没有认证"));
        assert_eq!(failure.message, "Request failed with status code 401");
    }

    #[tokio::test]
    async fn test_send_non_json_error_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/broken")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let failure = transport(&server.url())
            .send(RequestDescriptor::new("/broken", Method::GET).encode().unwrap())
            .await
            .unwrap_err();

        assert_eq!(failure.status, Some(502));
        assert_eq!(failure.body, Some(json!("Bad Gateway")));
    }

    #[tokio::test]
    async fn test_send_network_failure() {
        // Nothing listens on port 9 of localhost
        let t = HttpTransport::build("http://127.0.0.1:9/api", Duration::from_secs(2)).unwrap();
        let failure = t
            .send(RequestDescriptor::new("/x", Method::GET).encode().unwrap())
            .await
            .unwrap_err();

        assert_eq!(failure.status, None);
        assert!(failure.body.is_none());
        assert!(failure.message.starts_with("Network Error: "));
    }

    #[tokio::test]
    async fn test_send_timeout_failure() {
        // Accepts connections and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let t = HttpTransport::build(format!("http://{}/api", addr), Duration::from_millis(300))
            .unwrap();
        let failure = t
            .send(RequestDescriptor::new("/slow", Method::GET).encode().unwrap())
            .await
            .unwrap_err();
        server.abort();

        assert_eq!(failure.status, None);
        assert!(failure.body.is_none());
        assert_eq!(failure.message, "timeout of 300ms exceeded");
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(b"", ResponseFormat::Json), None);
        assert_eq!(
            decode_body(br#"{"a":1}"#, ResponseFormat::Json),
            Some(json!({"a": 1}))
        );
        assert_eq!(
            decode_body(br#"{"a":1}"#, ResponseFormat::Text),
            Some(json!(r#"{"a":1}"#))
        );
        assert_eq!(decode_body(b"oops", ResponseFormat::Json), Some(json!("oops")));
    }
}
