use std::borrow::Cow;

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::transport::TransportError;

/// Outcome of a single call: a real HTTP reply, or a synthetic one
/// standing in for a reply that never arrived.
///
/// Synthetic responses carry [`Response::TRANSPORT_FAILURE`] as status,
/// empty headers and an empty body; [`Response::failure`] explains why.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    failure: Option<TransportError>,
}

impl Response {
    /// Status of a synthetic response. Never produced by a real server.
    pub const TRANSPORT_FAILURE: u16 = 0;

    pub fn new(status: u16, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            failure: None,
        }
    }

    /// Builds the synthetic response for a request that got no reply.
    pub fn transport_failure(error: TransportError) -> Self {
        Self {
            status: Self::TRANSPORT_FAILURE,
            headers: HeaderMap::new(),
            body: Vec::new(),
            failure: Some(error),
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns `true` when no HTTP reply was received.
    pub fn is_transport_failure(&self) -> bool {
        self.status == Self::TRANSPORT_FAILURE
    }

    /// Why the transport failed, for synthetic responses.
    pub fn failure(&self) -> Option<&TransportError> {
        self.failure.as_ref()
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportErrorKind;
    use reqwest::header::HeaderValue;
    use serde::Deserialize;

    #[test]
    fn real_response_accessors() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        let resp = Response::new(200, headers, r#"{"cluster_name":"es","status":"green"}"#);

        assert!(resp.is_success());
        assert!(!resp.is_transport_failure());
        assert!(resp.failure().is_none());
        assert_eq!(resp.header("Content-Type"), Some("application/json"));
        assert!(resp.text().contains("green"));
    }

    #[test]
    fn json_body_deserializes() {
        #[derive(Deserialize)]
        struct Health {
            status: String,
        }
        let resp = Response::new(200, HeaderMap::new(), r#"{"status":"yellow"}"#);
        let health: Health = resp.json().unwrap();
        assert_eq!(health.status, "yellow");
    }

    #[test]
    fn error_status_is_not_success() {
        let resp = Response::new(404, HeaderMap::new(), "index_not_found_exception");
        assert!(!resp.is_success());
        assert!(!resp.is_transport_failure());
        assert_eq!(resp.status, 404);
    }

    #[test]
    fn synthetic_response_shape() {
        let resp = Response::transport_failure(TransportError::new(
            TransportErrorKind::Connect,
            "connection refused",
        ));
        assert_eq!(resp.status, Response::TRANSPORT_FAILURE);
        assert!(resp.is_transport_failure());
        assert!(!resp.is_success());
        assert!(resp.headers.is_empty());
        assert!(resp.body.is_empty());
        assert_eq!(resp.failure().unwrap().kind, TransportErrorKind::Connect);
    }

    #[test]
    fn invalid_utf8_text_is_lossy() {
        let resp = Response::new(500, HeaderMap::new(), vec![0xff, b'o', b'k']);
        assert_eq!(resp.text(), "\u{fffd}ok");
    }
}
