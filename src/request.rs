//! Outbound request type and the building rules shared by every verb.

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::sign::{SERVICE_NAME, sign_request};
use crate::transport::SendOptions;

/// Name of the multipart part carrying an uploaded file.
pub const UPLOAD_PART_NAME: &str = "upload_file";

/// A single named part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub name: String,
    pub content: Vec<u8>,
}

/// Request payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Body {
    #[default]
    Empty,
    Bytes(Vec<u8>),
    Multipart(FilePart),
}

impl Body {
    /// Raw bytes of the payload as they are hashed for signing.
    ///
    /// Multipart bodies have no stable byte form before encoding, so they
    /// return `None`.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Body::Empty => Some(&[]),
            Body::Bytes(bytes) => Some(bytes),
            Body::Multipart(_) => None,
        }
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, Body::Multipart(_))
    }
}

/// A fully-formed HTTP request ready for signing and transmission.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Body,
}

impl OutboundRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Body::Empty,
        }
    }

    /// Sets a header, replacing any existing value for the same name.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Parses a caller-supplied URL.
pub(crate) fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|source| Error::InvalidUrl {
        url: url.to_string(),
        source,
    })
}

/// Builds the request for one call and the options it is sent with.
///
/// Applies, in order: the `ApiKey` authorization header, the JSON content
/// type for byte bodies, and SigV4 signing when enabled. Multipart uploads
/// are never signed.
pub(crate) fn prepare(
    config: &Config,
    method: Method,
    url: &str,
    body: Body,
) -> Result<(OutboundRequest, SendOptions)> {
    let url = parse_url(url)?;
    let mut request = OutboundRequest::new(method, url);

    if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
        let value = HeaderValue::from_str(&format!("ApiKey {}", key)).map_err(|_| {
            Error::Configuration("API key contains characters not allowed in a header".into())
        })?;
        request = request.with_header(AUTHORIZATION, value);
    }

    if matches!(body, Body::Bytes(_)) {
        request = request.with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    request = request.with_body(body);

    if config.signing && !request.body.is_multipart() {
        let (credentials, region) = config.signing_params()?;
        request = sign_request(&request, &credentials, region, SERVICE_NAME)?;
    }

    let host = request.url.host_str().unwrap_or_default();
    let options = SendOptions {
        connect_timeout: Some(config.connect_timeout).filter(|t| !t.is_zero()),
        proxy: config.proxy_route_for(host),
    };

    Ok((request, options))
}
