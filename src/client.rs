use reqwest::Method;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::Instrument;

use crate::config::Config;
use crate::error::Result;
use crate::exec::{normalize, request_span, upload_body, warn_on_double_auth};
use crate::request::{Body, prepare};
use crate::response::Response;
use crate::transport::{ReqwestTransport, Transport};

/// Async client for a search server endpoint.
///
/// Every operation returns `Ok(Response)` once the request reaches the
/// transport, whatever happened on the wire: check [`Response::status`].
/// `Err` is reserved for problems found before sending (missing signing
/// settings, malformed URL, unreadable upload stream).
#[derive(Debug, Clone)]
pub struct Client<T = ReqwestTransport> {
    config: Config,
    transport: T,
}

impl Client {
    /// Creates a client sending through a pooled `reqwest` transport.
    pub fn new(config: Config) -> Result<Self> {
        let transport = ReqwestTransport::from_config(&config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> Client<T> {
    /// Creates a client sending through `transport`.
    pub fn with_transport(config: Config, transport: T) -> Self {
        warn_on_double_auth(&config);
        Self { config, transport }
    }

    /// Settings this client was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Transport requests are sent through.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends a GET with no body.
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.execute(Method::GET, url, Body::Empty).await
    }

    /// Sends `body` with `content-type: application/json`.
    pub async fn put(&self, url: &str, body: impl Into<Vec<u8>>) -> Result<Response> {
        self.execute(Method::PUT, url, Body::Bytes(body.into())).await
    }

    /// Sends `body` with `content-type: application/json`.
    pub async fn post(&self, url: &str, body: impl Into<Vec<u8>>) -> Result<Response> {
        self.execute(Method::POST, url, Body::Bytes(body.into())).await
    }

    /// Sends a DELETE with no body.
    pub async fn delete(&self, url: &str) -> Result<Response> {
        self.execute(Method::DELETE, url, Body::Empty).await
    }

    /// Uploads the contents of `reader` as the multipart part `upload_file`.
    ///
    /// Uploads are never signed.
    pub async fn post_file<R>(&self, url: &str, mut reader: R) -> Result<Response>
    where
        R: AsyncRead + Unpin,
    {
        let mut content = Vec::new();
        reader.read_to_end(&mut content).await?;
        self.execute(Method::POST, url, upload_body(content)).await
    }

    async fn execute(&self, method: Method, url: &str, body: Body) -> Result<Response> {
        let (request, options) = prepare(&self.config, method, url, body)?;

        let span = request_span(&request, &options);
        span.in_scope(|| tracing::debug!("sending request"));
        let outcome = self
            .transport
            .send(request, options)
            .instrument(span.clone())
            .await;

        Ok(span.in_scope(|| normalize(outcome)))
    }
}
