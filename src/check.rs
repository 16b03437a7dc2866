//! Server readiness check.
//!
//! Reports whether the configured search server answers its base URL with
//! HTTP 200. Used by health pages and admin settings screens.

use crate::client::Client;
use crate::response::Response;
use crate::transport::{ReqwestTransport, Transport};

/// Outcome category of a readiness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// No hostname is configured, so there is nothing to check.
    NotApplicable,
    Ok,
    Error,
}

/// Status plus a human-readable summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub summary: String,
}

impl CheckResult {
    fn new(status: CheckStatus, summary: impl Into<String>) -> Self {
        Self {
            status,
            summary: summary.into(),
        }
    }
}

/// Checks that the search server behind a [`Client`] is reachable.
#[derive(Debug, Clone)]
pub struct ServerReadyCheck<T = ReqwestTransport> {
    client: Client<T>,
}

impl<T: Transport> ServerReadyCheck<T> {
    pub fn new(client: Client<T>) -> Self {
        Self { client }
    }

    /// Runs the check.
    ///
    /// Without a hostname the result is [`CheckStatus::NotApplicable`] and no
    /// request is made. Otherwise the base URL is fetched and only status 200
    /// counts as ready.
    pub async fn result(&self) -> CheckResult {
        let config = self.client.config();
        if config.hostname.trim().is_empty() {
            return CheckResult::new(
                CheckStatus::NotApplicable,
                "search server hostname is not configured",
            );
        }

        let url = match config.base_url() {
            Ok(url) => url,
            Err(err) => return CheckResult::new(CheckStatus::Error, err.to_string()),
        };

        match self.client.get(&url).await {
            Ok(response) => summarize(&url, &response),
            Err(err) => CheckResult::new(CheckStatus::Error, format!("{}: {}", url, err)),
        }
    }
}

fn summarize(url: &str, response: &Response) -> CheckResult {
    let status = if response.status == 200 {
        CheckStatus::Ok
    } else {
        CheckStatus::Error
    };
    let summary = match response.failure() {
        Some(failure) => format!(
            "{} did not respond (status {}): {}",
            url, response.status, failure
        ),
        None => format!("{} responded with status {}", url, response.status),
    };
    CheckResult::new(status, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::transport::MockTransport;
    use std::sync::Arc;

    const VALID_HOSTNAME: &str = "http://valid.com";
    const INVALID_HOSTNAME: &str = "http://invalid.com";

    fn check(config: Config, mock: &Arc<MockTransport>) -> ServerReadyCheck<Arc<MockTransport>> {
        ServerReadyCheck::new(Client::with_transport(config, Arc::clone(mock)))
    }

    #[tokio::test]
    async fn hostname_not_set_is_not_applicable() {
        let mock = Arc::new(MockTransport::new().with_status(400, ""));
        let result = check(Config::default(), &mock).result().await;
        assert_eq!(result.status, CheckStatus::NotApplicable);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn status_200_is_ok() {
        let mock = Arc::new(MockTransport::new().with_status(200, "{}"));
        let config = Config::default().with_endpoint(VALID_HOSTNAME, 9200);
        let result = check(config, &mock).result().await;

        assert_eq!(result.status, CheckStatus::Ok);
        assert_eq!(result.summary, "http://valid.com:9200 responded with status 200");
        assert_eq!(
            mock.last_request().unwrap().url.as_str(),
            "http://valid.com:9200/"
        );
    }

    #[tokio::test]
    async fn status_404_is_error() {
        let mock = Arc::new(MockTransport::new().with_status(404, ""));
        let config = Config::default().with_endpoint(INVALID_HOSTNAME, 9200);
        let result = check(config, &mock).result().await;
        assert_eq!(result.status, CheckStatus::Error);
        assert!(result.summary.contains("status 404"));
    }

    #[tokio::test]
    async fn unreachable_server_is_error_with_sentinel_status() {
        // An empty queue makes the mock fail like a refused connection.
        let mock = Arc::new(MockTransport::new());
        let config = Config::default().with_endpoint(INVALID_HOSTNAME, 9200);
        let result = check(config, &mock).result().await;
        assert_eq!(result.status, CheckStatus::Error);
        assert!(result.summary.contains("did not respond (status 0)"));
    }

    #[tokio::test]
    async fn missing_port_is_error_without_request() {
        let mock = Arc::new(MockTransport::new().with_status(200, ""));
        let config = Config::default().with_hostname(VALID_HOSTNAME);
        let result = check(config, &mock).result().await;
        assert_eq!(result.status, CheckStatus::Error);
        assert!(result.summary.contains("configuration error"));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn signing_misconfiguration_is_error() {
        let mock = Arc::new(MockTransport::new().with_status(200, ""));
        let config = Config::default()
            .with_endpoint(VALID_HOSTNAME, 9200)
            .with_signing(true);
        let result = check(config, &mock).result().await;
        assert_eq!(result.status, CheckStatus::Error);
        assert!(result.summary.contains("signing"));
        assert_eq!(mock.call_count(), 0);
    }
}
