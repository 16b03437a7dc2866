//! Transmission of prepared requests.
//!
//! [`Transport`] is the seam between the request client and the network.
//! [`ReqwestTransport`] is the production implementation; [`MockTransport`]
//! records requests and replays queued responses for tests.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;

use crate::config::{Config, ProxyRoute};
use crate::error::Result;
use crate::request::{Body, OutboundRequest};
use crate::response::Response;

/// Per-request transmission settings computed by the client.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SendOptions {
    /// Connect-phase timeout; `None` waits indefinitely.
    ///
    /// The reqwest transports fix this when they are built from the
    /// [`Config`], so they ignore it here. Substitute transports may apply
    /// it per request.
    pub connect_timeout: Option<Duration>,
    /// Proxy to route through; `None` connects directly.
    pub proxy: Option<ProxyRoute>,
}

/// Broad class of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection refused, DNS failure, TLS handshake failure.
    Connect,
    Timeout,
    /// The reply started but its body could not be read.
    Body,
    /// The request could not be encoded or dispatched.
    Request,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Body => "body",
            TransportErrorKind::Request => "request",
            TransportErrorKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// A request that produced no HTTP reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} failure: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_body() || err.is_decode() {
            TransportErrorKind::Body
        } else if err.is_request() || err.is_builder() {
            TransportErrorKind::Request
        } else {
            TransportErrorKind::Other
        };

        // reqwest's top-level message hides the cause (e.g. "connection refused").
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::new(kind, message)
    }
}

/// Sends a prepared request and returns whatever HTTP reply came back.
///
/// Implementations return `Ok` for every status code, including 4xx/5xx, and
/// `Err` only when no reply was received.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: OutboundRequest,
        options: SendOptions,
    ) -> impl Future<Output = std::result::Result<Response, TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn send(
        &self,
        request: OutboundRequest,
        options: SendOptions,
    ) -> impl Future<Output = std::result::Result<Response, TransportError>> + Send {
        (**self).send(request, options)
    }
}

/// Transport backed by pooled `reqwest` clients.
///
/// The connect timeout and proxy are fixed when the transport is built from a
/// [`Config`]; one client connects directly and, when a proxy is configured,
/// a second one goes through it. [`SendOptions::proxy`] selects between them.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    direct: reqwest::Client,
    proxied: Option<(ProxyRoute, reqwest::Client)>,
}

impl ReqwestTransport {
    /// Builds the direct and, when configured, proxied clients.
    pub fn from_config(config: &Config) -> Result<Self> {
        let direct = client_builder(config).no_proxy().build()?;

        let proxied = match config.proxy.as_ref().filter(|p| !p.host.is_empty()) {
            Some(proxy) => {
                let route = proxy.route();
                let client = client_builder(config)
                    .proxy(reqwest::Proxy::all(route.url())?)
                    .build()?;
                Some((route, client))
            }
            None => None,
        };

        Ok(Self { direct, proxied })
    }

    fn client_for(
        &self,
        proxy: Option<&ProxyRoute>,
    ) -> std::result::Result<&reqwest::Client, TransportError> {
        match (proxy, &self.proxied) {
            (None, _) => Ok(&self.direct),
            (Some(route), Some((configured, client))) if route == configured => Ok(client),
            (Some(route), _) => Err(TransportError::new(
                TransportErrorKind::Request,
                format!("no client configured for proxy {}", route.authority()),
            )),
        }
    }
}

fn client_builder(config: &Config) -> reqwest::ClientBuilder {
    let builder = reqwest::Client::builder();
    if config.connect_timeout.is_zero() {
        builder
    } else {
        builder.connect_timeout(config.connect_timeout)
    }
}

impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: OutboundRequest,
        options: SendOptions,
    ) -> std::result::Result<Response, TransportError> {
        let client = self.client_for(options.proxy.as_ref())?;

        let mut builder = client
            .request(request.method, request.url)
            .headers(request.headers);
        builder = match request.body {
            Body::Empty => builder,
            Body::Bytes(bytes) => builder.body(bytes),
            Body::Multipart(part) => builder.multipart(
                reqwest::multipart::Form::new()
                    .part(part.name, reqwest::multipart::Part::bytes(part.content)),
            ),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(Response::new(status, headers, body.to_vec()))
    }
}

/// In-memory transport for tests.
///
/// Every request is recorded with its [`SendOptions`]; replies are taken from
/// a queue in order. An empty queue answers with a connect failure.
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<std::result::Result<Response, TransportError>>>,
    history: Mutex<Vec<(OutboundRequest, SendOptions)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an HTTP reply.
    pub fn with_response(self, response: Response) -> Self {
        self.push(Ok(response));
        self
    }

    /// Queues a reply with the given status and body and no headers.
    pub fn with_status(self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.with_response(Response::new(status, Default::default(), body))
    }

    /// Queues a transport failure.
    pub fn with_failure(self, error: TransportError) -> Self {
        self.push(Err(error));
        self
    }

    pub fn push(&self, reply: std::result::Result<Response, TransportError>) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    /// Number of requests that reached the transport.
    pub fn call_count(&self) -> usize {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Recorded requests with the options they were sent with, oldest first.
    pub fn history(&self) -> Vec<(OutboundRequest, SendOptions)> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_request(&self) -> Option<OutboundRequest> {
        self.history().pop().map(|(request, _)| request)
    }

    pub fn last_options(&self) -> Option<SendOptions> {
        self.history().pop().map(|(_, options)| options)
    }

    pub(crate) fn respond(
        &self,
        request: OutboundRequest,
        options: SendOptions,
    ) -> std::result::Result<Response, TransportError> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((request, options));
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::new(
                    TransportErrorKind::Connect,
                    "mock transport has no queued reply",
                ))
            })
    }
}

impl Transport for MockTransport {
    async fn send(
        &self,
        request: OutboundRequest,
        options: SendOptions,
    ) -> std::result::Result<Response, TransportError> {
        self.respond(request, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProxyConfig;
    use reqwest::Method;

    fn request() -> OutboundRequest {
        OutboundRequest::new(Method::GET, url::Url::parse("http://localhost:9200/").unwrap())
    }

    #[tokio::test]
    async fn mock_replays_in_order_and_records() {
        let mock = MockTransport::new()
            .with_status(200, "first")
            .with_status(503, "second");

        let a = mock.send(request(), SendOptions::default()).await.unwrap();
        let b = mock.send(request(), SendOptions::default()).await.unwrap();
        let c = mock.send(request(), SendOptions::default()).await;

        assert_eq!((a.status, b.status), (200, 503));
        assert_eq!(c.unwrap_err().kind, TransportErrorKind::Connect);
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn arc_transport_delegates() {
        let mock = Arc::new(MockTransport::new().with_status(204, ""));
        let shared = Arc::clone(&mock);
        let resp = shared.send(request(), SendOptions::default()).await.unwrap();
        assert_eq!(resp.status, 204);
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn reqwest_transport_selects_client_by_route() {
        let config = Config::default().with_proxy(ProxyConfig::new("proxy.com", Some(3128)));
        let transport = ReqwestTransport::from_config(&config).unwrap();
        let route = config.proxy_route_for("example.com").unwrap();

        assert!(transport.client_for(None).is_ok());
        assert!(transport.client_for(Some(&route)).is_ok());

        let other = ProxyConfig::new("other.com", Some(8080)).route();
        let err = transport.client_for(Some(&other)).unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Request);
        assert!(err.message.contains("other.com:8080"));
    }

    #[test]
    fn transport_error_display() {
        let err = TransportError::new(TransportErrorKind::Timeout, "connect timed out");
        assert_eq!(err.to_string(), "timeout failure: connect timed out");
    }
}
