use thiserror::Error;

/// Maximum characters of a response body to include in log events.
pub(crate) const MAX_LOGGED_BODY_CHARS: usize = 200;

/// Errors raised before a request reaches the transport.
///
/// Connection failures are never reported through this type: they come back
/// as a synthetic [`crate::Response`] carrying
/// [`crate::Response::TRANSPORT_FAILURE`].
#[derive(Debug, Error)]
pub enum Error {
    /// Required settings are missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request handed to the signer is malformed.
    #[error("signing error: {0}")]
    Signing(String),

    /// The target URL could not be parsed.
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Reading an upload stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP client backing the default transport could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl Error {
    /// Returns `true` for errors caused by missing or invalid settings.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }
}

/// A specialized Result type for request-layer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Truncates a string to at most `max_chars` characters on a valid UTF-8 boundary.
pub(crate) fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
