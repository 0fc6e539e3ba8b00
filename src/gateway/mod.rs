//! The API gateway: one transport, one pair of interceptor stages, three
//! ways of building a request.

mod envelope;
mod interceptor;

use log::debug;
use reqwest::Method;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, HeaderValue};
use serde_json::Value;

pub use envelope::{DEFAULT_ERROR_MESSAGE, SUCCESS_CODE, ServerEnvelope};
pub use interceptor::{InboundStage, OutboundStage};

use crate::auth::CredentialStore;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::{
    FORM_CONTENT_TYPE, HttpTransport, MULTIPART_CONTENT_TYPE, Payload, QueryParams,
    RequestDescriptor, ResponseFormat, Transport, form_urlencode,
};
use crate::navigate::Navigator;
use crate::notify::Notifier;

/// Content type `upload_video` is usually called with. It does not reach the
/// wire; uploads always use the multipart header.
pub const DEFAULT_UPLOAD_CONTENT_TYPE: &str = FORM_CONTENT_TYPE;

pub type GatewayResult = Result<ServerEnvelope, GatewayError>;

pub struct ApiGateway<S, N, V, T>
where
    S: CredentialStore,
    N: Notifier,
    V: Navigator,
    T: Transport,
{
    outbound: OutboundStage<S>,
    inbound: InboundStage<N, V>,
    transport: T,
}

impl<S, N, V> ApiGateway<S, N, V, HttpTransport>
where
    S: CredentialStore,
    N: Notifier,
    V: Navigator,
{
    /// Creates a gateway backed by a real HTTP transport for `config`.
    pub fn connect(
        config: &GatewayConfig,
        store: S,
        notifier: N,
        navigator: V,
    ) -> anyhow::Result<Self> {
        let transport = HttpTransport::build(config.base_url(), config.timeout)?;
        debug!(
            "Gateway ready at {} (timeout {}s)",
            transport.base_url(),
            config.timeout.as_secs()
        );
        Ok(Self::new(config, store, notifier, navigator, transport))
    }
}

impl<S, N, V, T> ApiGateway<S, N, V, T>
where
    S: CredentialStore,
    N: Notifier,
    V: Navigator,
    T: Transport,
{
    pub fn new(config: &GatewayConfig, store: S, notifier: N, navigator: V, transport: T) -> Self {
        Self {
            outbound: OutboundStage::new(store, config.fallback_token.clone()),
            inbound: InboundStage::new(config, notifier, navigator),
            transport,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends a descriptor through both interceptor stages. All entry points
    /// end up here.
    #[tracing::instrument(skip(self, request))]
    pub async fn dispatch(&self, request: RequestDescriptor) -> GatewayResult {
        let request = self.outbound.apply(Ok(request))?.encode()?;

        match self.transport.send(request).await {
            Ok(response) => self.inbound.on_success(response),
            Err(failure) => Err(self.inbound.on_failure(failure)),
        }
    }

    /// Plain JSON call. `params` become the query string; `body` is sent
    /// only for methods other than GET.
    #[tracing::instrument(skip(self, params, body))]
    pub async fn create_api(
        &self,
        url: &str,
        method: Method,
        params: Option<QueryParams>,
        body: Option<Value>,
    ) -> GatewayResult {
        let mut request = RequestDescriptor::new(url, method);
        request.params = params;
        if request.method != Method::GET {
            request.body = body.map(Payload::Json);
        } else if body.is_some() {
            debug!("Dropping body of GET {}", url);
        }
        self.dispatch(request).await
    }

    /// `create_api` with GET.
    pub async fn get(&self, url: &str, params: Option<QueryParams>) -> GatewayResult {
        self.create_api(url, Method::GET, params, None).await
    }

    /// URL-encoded form call. `body` is a key/value mapping serialized as
    /// `k=v&k=v&`.
    #[tracing::instrument(skip(self, body))]
    pub async fn create_form_api(&self, url: &str, method: Method, body: Value) -> GatewayResult {
        let mut request = RequestDescriptor::new(url, method);
        request.body = Some(Payload::Json(body));
        request
            .headers
            .insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        request.response_format = ResponseFormat::Json;
        request.transforms.push(form_urlencode);
        self.dispatch(request).await
    }

    /// Multipart upload. `body` is sent untouched with
    /// `multipart/form-data; boundary=WebAppBoundary`; `content_type` is
    /// accepted for call-site compatibility and not applied.
    #[tracing::instrument(skip(self, body))]
    pub async fn upload_video(
        &self,
        url: &str,
        method: Method,
        body: impl Into<Payload> + Send,
        content_type: Option<&str>,
    ) -> GatewayResult {
        if let Some(content_type) = content_type.filter(|c| *c != MULTIPART_CONTENT_TYPE) {
            debug!(
                "Ignoring content type {} for upload to {}, using {}",
                content_type, url, MULTIPART_CONTENT_TYPE
            );
        }

        let mut request = RequestDescriptor::new(url, method);
        request.body = Some(body.into());
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(MULTIPART_CONTENT_TYPE));
        self.dispatch(request).await
    }
}
