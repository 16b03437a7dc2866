//! Synchronous (blocking) request client.
//!
//! This module is only available when the `blocking` feature is enabled.
//! It mirrors the async [`crate::client::Client`] API using `reqwest::blocking`
//! and must not be used from inside an async runtime.
//!
//! # Example
//!
//! ```no_run
//! use es_request::Config;
//! use es_request::blocking::Client;
//!
//! fn main() -> es_request::Result<()> {
//!     let client = Client::new(Config::default().with_endpoint("http://localhost", 9200))?;
//!
//!     let resp = client.get("http://localhost:9200/_cluster/health")?;
//!     if resp.is_transport_failure() {
//!         eprintln!("server unreachable");
//!     }
//!     Ok(())
//! }
//! ```

use std::io::Read;
use std::sync::Arc;

use reqwest::Method;

use crate::config::{Config, ProxyRoute};
use crate::error::Result;
use crate::exec::{normalize, request_span, upload_body, warn_on_double_auth};
use crate::request::{Body, OutboundRequest, prepare};
use crate::response::Response;
use crate::transport::{MockTransport, SendOptions, TransportError, TransportErrorKind};

/// Blocking counterpart of [`crate::transport::Transport`].
pub trait BlockingTransport: Send + Sync {
    fn send(
        &self,
        request: OutboundRequest,
        options: SendOptions,
    ) -> std::result::Result<Response, TransportError>;
}

impl<T: BlockingTransport + ?Sized> BlockingTransport for Arc<T> {
    fn send(
        &self,
        request: OutboundRequest,
        options: SendOptions,
    ) -> std::result::Result<Response, TransportError> {
        (**self).send(request, options)
    }
}

impl BlockingTransport for MockTransport {
    fn send(
        &self,
        request: OutboundRequest,
        options: SendOptions,
    ) -> std::result::Result<Response, TransportError> {
        self.respond(request, options)
    }
}

/// Blocking transport backed by pooled `reqwest::blocking` clients.
#[derive(Debug, Clone)]
pub struct ReqwestBlockingTransport {
    direct: reqwest::blocking::Client,
    proxied: Option<(ProxyRoute, reqwest::blocking::Client)>,
}

impl ReqwestBlockingTransport {
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
}

fn client_builder(config: &Config) -> reqwest::blocking::ClientBuilder {
    let builder = reqwest::blocking::Client::builder();
    if config.connect_timeout.is_zero() {
        builder
    } else {
        builder.connect_timeout(config.connect_timeout)
    }
}

impl BlockingTransport for ReqwestBlockingTransport {
    fn send(
        &self,
        request: OutboundRequest,
        options: SendOptions,
    ) -> std::result::Result<Response, TransportError> {
        let client = match (options.proxy.as_ref(), &self.proxied) {
            (None, _) => &self.direct,
            (Some(route), Some((configured, client))) if route == configured => client,
            (Some(route), _) => {
                return Err(TransportError::new(
                    TransportErrorKind::Request,
                    format!("no client configured for proxy {}", route.authority()),
                ));
            }
        };

        let mut builder = client
            .request(request.method, request.url)
            .headers(request.headers);
        builder = match request.body {
            Body::Empty => builder,
            Body::Bytes(bytes) => builder.body(bytes),
            Body::Multipart(part) => builder.multipart(
                reqwest::blocking::multipart::Form::new()
                    .part(part.name, reqwest::blocking::multipart::Part::bytes(part.content)),
            ),
        };

        let response = builder.send()?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes()?;

        Ok(Response::new(status, headers, body.to_vec()))
    }
}

/// Synchronous client for a search server endpoint.
#[derive(Debug, Clone)]
pub struct Client<T = ReqwestBlockingTransport> {
    config: Config,
    transport: T,
}

impl Client {
    /// Creates a blocking client sending through pooled `reqwest` clients.
    pub fn new(config: Config) -> Result<Self> {
        let transport = ReqwestBlockingTransport::from_config(&config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: BlockingTransport> Client<T> {
    /// Creates a blocking client sending through `transport`.
    pub fn with_transport(config: Config, transport: T) -> Self {
        warn_on_double_auth(&config);
        Self { config, transport }
    }

    /// Settings this client was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sends a GET with no body.
    pub fn get(&self, url: &str) -> Result<Response> {
        self.execute(Method::GET, url, Body::Empty)
    }

    /// Sends `body` with `content-type: application/json`.
    pub fn put(&self, url: &str, body: impl Into<Vec<u8>>) -> Result<Response> {
        self.execute(Method::PUT, url, Body::Bytes(body.into()))
    }

    /// Sends `body` with `content-type: application/json`.
    pub fn post(&self, url: &str, body: impl Into<Vec<u8>>) -> Result<Response> {
        self.execute(Method::POST, url, Body::Bytes(body.into()))
    }

    /// Sends a DELETE with no body.
    pub fn delete(&self, url: &str) -> Result<Response> {
        self.execute(Method::DELETE, url, Body::Empty)
    }

    /// Uploads the contents of `reader` as the multipart part `upload_file`.
    pub fn post_file<R: Read>(&self, url: &str, mut reader: R) -> Result<Response> {
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;
        self.execute(Method::POST, url, upload_body(content))
    }

    fn execute(&self, method: Method, url: &str, body: Body) -> Result<Response> {
        let (request, options) = prepare(&self.config, method, url, body)?;

        let span = request_span(&request, &options);
        let _entered = span.enter();
        tracing::debug!("sending request");
        let outcome = self.transport.send(request, options);

        Ok(normalize(outcome))
    }
}
