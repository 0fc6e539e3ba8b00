use anyhow::{Context, Result};
use log::debug;
use reqwest::Method;
use serde_json::{Map, Value};
use std::path::Path;

use crate::{
    auth::CredentialStore,
    gateway::{ApiGateway, DEFAULT_UPLOAD_CONTENT_TYPE, ServerEnvelope},
    http::{MultipartBody, QueryParams, Transport},
    navigate::Navigator,
    notify::Notifier,
    runtime::Runtime,
};

pub mod config;

pub use config::{Config, ConsoleGateway};

/// Parses an HTTP method name, case-insensitively.
pub fn parse_method(s: &str) -> Result<Method, String> {
    Method::from_bytes(s.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| format!("invalid HTTP method '{}'", s))
}

/// Parses `key=value`. The value may itself contain `=`.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

/// Issues a JSON call. `data` is parsed as JSON.
#[tracing::instrument(skip(gateway, data))]
pub async fn request<S, N, V, T>(
    gateway: &ApiGateway<S, N, V, T>,
    url: &str,
    method: Method,
    query: QueryParams,
    data: Option<&str>,
) -> Result<ServerEnvelope>
where
    S: CredentialStore,
    N: Notifier,
    V: Navigator,
    T: Transport,
{
    let body = data
        .map(|d| serde_json::from_str::<Value>(d).context("Request body is not valid JSON"))
        .transpose()?;
    let params = if query.is_empty() { None } else { Some(query) };

    Ok(gateway.create_api(url, method, params, body).await?)
}

/// Issues a URL-encoded form call built from `fields`.
#[tracing::instrument(skip(gateway, fields))]
pub async fn form<S, N, V, T>(
    gateway: &ApiGateway<S, N, V, T>,
    url: &str,
    method: Method,
    fields: Vec<(String, String)>,
) -> Result<ServerEnvelope>
where
    S: CredentialStore,
    N: Notifier,
    V: Navigator,
    T: Transport,
{
    let body: Map<String, Value> = fields
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();

    Ok(gateway.create_form_api(url, method, Value::Object(body)).await?)
}

/// Uploads `file` as a multipart part named `name`, followed by any extra
/// text `fields`.
#[tracing::instrument(skip(runtime, gateway, fields))]
pub async fn upload<R, S, N, V, T>(
    runtime: &R,
    gateway: &ApiGateway<S, N, V, T>,
    url: &str,
    method: Method,
    file: &Path,
    name: &str,
    fields: Vec<(String, String)>,
) -> Result<ServerEnvelope>
where
    R: Runtime,
    S: CredentialStore,
    N: Notifier,
    V: Navigator,
    T: Transport,
{
    let data = runtime.read(file)?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} is not a file", file.display()))?;
    debug!("Uploading {} ({} bytes)", file_name, data.len());

    let body = fields
        .into_iter()
        .fold(MultipartBody::new(), |body, (k, v)| body.text(k, v))
        .file(name, file_name, data);

    Ok(gateway
        .upload_video(url, method, body.into_bytes(), Some(DEFAULT_UPLOAD_CONTENT_TYPE))
        .await?)
}

/// Pretty JSON for printing.
pub fn render(envelope: &ServerEnvelope) -> Result<String> {
    serde_json::to_string_pretty(envelope).context("Failed to render response")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MockCredentialStore;
    use crate::config::GatewayConfig;
    use crate::error::GatewayError;
    use crate::http::{MockTransport, TransportResponse};
    use crate::navigate::MockNavigator;
    use crate::notify::MockNotifier;
    use crate::runtime::MockRuntime;
    use serde_json::json;
    use std::path::PathBuf;

    fn gateway(
        transport: MockTransport,
        notifications: usize,
    ) -> ApiGateway<MockCredentialStore, MockNotifier, MockNavigator, MockTransport> {
        let mut store = MockCredentialStore::new();
        store.expect_get_token().returning(|| None);
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .times(notifications)
            .return_const(());
        ApiGateway::new(
            &GatewayConfig::default(),
            store,
            notifier,
            MockNavigator::new(),
            transport,
        )
    }

    fn ok_transport(
        check: impl Fn(&crate::http::OutboundRequest) + Send + Sync + 'static,
    ) -> MockTransport {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(move |request| {
            check(&request);
            Ok(TransportResponse {
                status: 200,
                body: json!({"code": 200, "data": "done"}),
            })
        });
        transport
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("get").unwrap(), Method::GET);
        assert_eq!(parse_method("Patch").unwrap(), Method::PATCH);
        assert!(parse_method("BAD METHOD").is_err());
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("a=b=c").unwrap(),
            ("a".to_string(), "b=c".to_string())
        );
        assert_eq!(
            parse_key_value("empty=").unwrap(),
            ("empty".to_string(), String::new())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[tokio::test]
    async fn test_request_parses_json_body() {
        let transport = ok_transport(|request| {
            assert_eq!(request.method, Method::PUT);
            assert_eq!(request.body.as_deref(), Some(br#"{"id":7}"#.as_slice()));
            assert_eq!(request.query, vec![("v".to_string(), "2".to_string())]);
        });
        let gw = gateway(transport, 0);

        let envelope = request(
            &gw,
            "/course/7",
            Method::PUT,
            vec![("v".to_string(), "2".to_string())],
            Some(r#"{"id": 7}"#),
        )
        .await
        .unwrap();
        assert_eq!(envelope.data, Some(json!("done")));
    }

    #[tokio::test]
    async fn test_request_rejects_invalid_json() {
        let mut transport = MockTransport::new();
        transport.expect_send().never();
        let gw = gateway(transport, 0);

        let err = request(&gw, "/x", Method::POST, vec![], Some("{oops"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[tokio::test]
    async fn test_form_keeps_field_order() {
        let transport = ok_transport(|request| {
            assert_eq!(request.body.as_deref(), Some(b"username=u&password=p%26w&".as_slice()));
        });
        let gw = gateway(transport, 0);

        form(
            &gw,
            "/auth/login",
            Method::POST,
            vec![
                ("username".to_string(), "u".to_string()),
                ("password".to_string(), "p&w".to_string()),
            ],
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_upload_builds_multipart_body() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read()
            .returning(|_| Ok(b"VIDEO".to_vec()));

        let transport = ok_transport(|request| {
            let body = String::from_utf8(request.body.clone().unwrap()).unwrap();
            assert!(body.starts_with(
                "--WebAppBoundary\r\nContent-Disposition: form-data; name=\"chunk\""
            ));
            assert!(body.contains("filename=\"intro.mp4\""));
            assert!(body.contains("VIDEO"));
            assert!(body.ends_with("--WebAppBoundary--\r\n"));
        });
        let gw = gateway(transport, 0);

        upload(
            &runtime,
            &gw,
            "/media/upload",
            Method::POST,
            &PathBuf::from("/videos/intro.mp4"),
            "file",
            vec![("chunk".to_string(), "1".to_string())],
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_upload_missing_file() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read()
            .returning(|_| Err(anyhow::anyhow!("No such file")));
        let mut transport = MockTransport::new();
        transport.expect_send().never();
        let gw = gateway(transport, 0);

        let result = upload(
            &runtime,
            &gw,
            "/media/upload",
            Method::POST,
            Path::new("/missing.mp4"),
            "file",
            vec![],
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_rejection_surfaces_gateway_error() {
        let mut transport = MockTransport::new();
        transport.expect_send().returning(|_| {
            Ok(TransportResponse {
                status: 200,
                body: json!({"code": 500, "message": "课程不存在"}),
            })
        });
        let gw = gateway(transport, 1);

        let err = request(&gw, "/course/1", Method::GET, vec![], None)
            .await
            .unwrap_err();
        let gateway_err = err.downcast_ref::<GatewayError>().unwrap();
        assert_eq!(gateway_err.to_string(), "课程不存在");
    }

    #[test]
    fn test_render() {
        let envelope = ServerEnvelope {
            code: 200,
            message: None,
            data: Some(json!({"x": 1})),
            extra: Map::new(),
        };
        let text = render(&envelope).unwrap();
        assert!(text.contains("\"code\": 200"));
        assert!(!text.contains("message"));
    }
}
