//! Signed HTTP request layer for Elasticsearch / OpenSearch endpoints.
//!
//! The [`Client`] issues GET, PUT, POST, DELETE and multipart file uploads,
//! optionally adding an `ApiKey` authorization header, signing requests with
//! AWS Signature Version 4, and routing through an outbound proxy.
//!
//! Every call that reaches the network yields a [`Response`]. Connection
//! failures and timeouts do not raise errors; they produce a synthetic
//! response whose status is [`Response::TRANSPORT_FAILURE`] (`0`), so callers
//! check one status code for both "server said no" and "server unreachable".
//!
//! # Quick Start
//!
//! ```no_run
//! use es_request::{Client, Config};
//!
//! # async fn example() -> es_request::Result<()> {
//! let config = Config::default()
//!     .with_endpoint("https://search.example.com", 443)
//!     .with_signing(true)
//!     .with_signing_credentials("AKIDEXAMPLE", "secret")
//!     .with_region("ap-southeast-2");
//! let client = Client::new(config)?;
//!
//! let resp = client
//!     .post("https://search.example.com/docs/_search", r#"{"query":{"match_all":{}}}"#)
//!     .await?;
//!
//! if resp.is_transport_failure() {
//!     println!("no reply: {:?}", resp.failure());
//! } else {
//!     println!("HTTP {}: {}", resp.status, resp.text());
//! }
//! # Ok(())
//! # }
//! ```

pub mod check;
pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod request;
pub mod response;
pub mod sign;
pub mod transport;

#[cfg(feature = "blocking")]
pub mod blocking;

mod exec;

pub use check::{CheckResult, CheckStatus, ServerReadyCheck};
pub use client::Client;
pub use config::{Config, ProxyConfig, ProxyKind, ProxyRoute};
pub use credential::Credentials;
pub use error::{Error, Result};
pub use request::{Body, FilePart, OutboundRequest, UPLOAD_PART_NAME};
pub use response::Response;
pub use sign::{SERVICE_NAME, sign_request, sign_request_at};
pub use transport::{
    MockTransport, ReqwestTransport, SendOptions, Transport, TransportError, TransportErrorKind,
};

// Compile-time assertions: key types must be Send + Sync for use across threads.
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    let _ = assert_send_sync::<Client>;
    let _ = assert_send_sync::<Config>;
    let _ = assert_send_sync::<Response>;
    let _ = assert_send_sync::<Error>;
    let _ = assert_send_sync::<MockTransport>;
};
