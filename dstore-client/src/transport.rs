/// Authorized transport: the network boundary of the request layer
///
/// The dispatcher hands protocol-level request parameters to a transport,
/// which first authorizes them (attaching credentials) and then performs
/// the exchange. Retries and timeouts, if any, live behind this trait.
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use std::time::Duration;

use crate::error::{ClientError, Result};

/// Response body, possibly delivered in several chunks
pub type BodyStream = BoxStream<'static, Result<Bytes>>;

/// Protocol-level parameters of one request
#[derive(Debug, Clone)]
pub struct RequestParams {
    pub method: Method,
    pub host: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl RequestParams {
    pub fn url(&self) -> String {
        format!("{}{}", self.host, self.path)
    }

    /// First header value with the given name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }
}

/// Raw response from the transport
pub struct TransportResponse {
    pub status: u16,
    pub body: BodyStream,
}

impl TransportResponse {
    pub fn new(status: u16, body: BodyStream) -> Self {
        Self { status, body }
    }

    /// Response whose body arrives in a single chunk
    pub fn from_bytes(status: u16, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        Self::new(status, stream::once(async move { Ok(body) }).boxed())
    }

    /// Response whose body arrives in the given chunks
    pub fn from_chunks(status: u16, chunks: Vec<Bytes>) -> Self {
        Self::new(status, stream::iter(chunks.into_iter().map(Ok)).boxed())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait AuthorizedTransport: Send + Sync {
    /// Attach credentials to the request, or fail
    async fn authorize(&self, params: RequestParams) -> Result<RequestParams>;

    /// Perform the network exchange for already-authorized parameters
    async fn send(&self, params: RequestParams) -> Result<TransportResponse>;
}

/// HTTP transport over reqwest with a static bearer token
pub struct HttpTransport {
    client: reqwest::Client,
    token: Option<String>,
}

impl HttpTransport {
    /// Create a transport; requests are sent unauthenticated when `token` is None
    pub fn new(token: Option<String>) -> Result<Self> {
        Self::with_timeout(token, Duration::from_secs(60))
    }

    pub fn with_timeout(token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .gzip(true)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, token })
    }
}

#[async_trait]
impl AuthorizedTransport for HttpTransport {
    async fn authorize(&self, mut params: RequestParams) -> Result<RequestParams> {
        if let Some(token) = &self.token {
            params.set_header(AUTHORIZATION.as_str(), format!("Bearer {}", token));
        }
        Ok(params)
    }

    async fn send(&self, params: RequestParams) -> Result<TransportResponse> {
        let mut headers = HeaderMap::new();
        for (name, value) in &params.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ClientError::InvalidArgument(format!("Invalid header name: {}", e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ClientError::InvalidArgument(format!("Invalid header value: {}", e)))?;
            headers.insert(name, value);
        }

        let response = self
            .client
            .request(params.method.clone(), params.url())
            .headers(headers)
            .body(params.body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ClientError::from))
            .boxed();

        Ok(TransportResponse::new(status, body))
    }
}
