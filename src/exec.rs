//! Common execution utilities for async and blocking clients.

use tracing::Span;

use crate::config::Config;
use crate::error::{MAX_LOGGED_BODY_CHARS, truncate_str};
use crate::request::{Body, FilePart, OutboundRequest, UPLOAD_PART_NAME};
use crate::response::Response;
use crate::transport::{SendOptions, TransportError};

/// Span covering one outbound call.
pub(crate) fn request_span(request: &OutboundRequest, options: &SendOptions) -> Span {
    tracing::debug_span!(
        "search_request",
        method = %request.method,
        url = %request.url,
        signed = request.headers.contains_key("x-amz-date"),
        proxy = options.proxy.as_ref().map(|p| p.authority()),
    )
}

/// Turns a transport outcome into the response handed to the caller.
///
/// HTTP error statuses pass through untouched; a missing reply becomes the
/// synthetic [`Response::TRANSPORT_FAILURE`] response.
pub(crate) fn normalize(outcome: Result<Response, TransportError>) -> Response {
    match outcome {
        Ok(response) => {
            if response.is_success() {
                tracing::debug!(status = response.status, "search server replied");
            } else {
                tracing::debug!(
                    status = response.status,
                    body = truncate_str(&response.text(), MAX_LOGGED_BODY_CHARS),
                    "search server replied with error status"
                );
            }
            response
        }
        Err(err) => {
            tracing::warn!(error = %err, "no response from search server");
            Response::transport_failure(err)
        }
    }
}

/// Multipart body carrying an uploaded file.
pub(crate) fn upload_body(content: Vec<u8>) -> Body {
    Body::Multipart(FilePart {
        name: UPLOAD_PART_NAME.to_string(),
        content,
    })
}

/// Warns when a config sends both an API key and a signature.
///
/// The signature overwrites the `ApiKey` authorization header on signed
/// requests; uploads still carry the API key.
pub(crate) fn warn_on_double_auth(config: &Config) {
    if config.signing && config.has_api_key() {
        tracing::warn!(
            "both an API key and request signing are configured; \
             signed requests will not send the API key"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportErrorKind;
    use reqwest::header::HeaderMap;

    #[test]
    fn normalize_passes_http_errors_through() {
        let resp = normalize(Ok(Response::new(500, HeaderMap::new(), "boom")));
        assert_eq!(resp.status, 500);
        assert_eq!(resp.body, b"boom");
        assert!(resp.failure().is_none());
    }

    #[test]
    fn normalize_turns_failures_into_sentinel() {
        let resp = normalize(Err(TransportError::new(
            TransportErrorKind::Timeout,
            "connect timed out",
        )));
        assert_eq!(resp.status, Response::TRANSPORT_FAILURE);
        assert_eq!(resp.failure().unwrap().kind, TransportErrorKind::Timeout);
    }

    #[test]
    fn upload_body_uses_fixed_part_name() {
        match upload_body(b"pdf".to_vec()) {
            Body::Multipart(part) => {
                assert_eq!(part.name, "upload_file");
                assert_eq!(part.content, b"pdf");
            }
            other => panic!("expected multipart body, got {:?}", other),
        }
    }
}
