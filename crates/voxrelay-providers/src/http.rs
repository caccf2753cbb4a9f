//! Outbound HTTP policy: per-request timeout plus a bounded retry.

use std::time::Duration;

use tracing::{debug, warn};

use voxrelay_core::config::HttpConfig;
use voxrelay_core::error::{ClientError, Service};

/// Timeout and retry budget applied to every service call.
#[derive(Debug, Clone)]
pub struct HttpPolicy {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for HttpPolicy {
    fn default() -> Self {
        Self::from(&HttpConfig::default())
    }
}

impl From<&HttpConfig> for HttpPolicy {
    fn from(config: &HttpConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.timeout_ms),
            max_attempts: config.max_attempts.max(1),
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }
}

impl HttpPolicy {
    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Map a transport-level reqwest error onto the typed client error.
    pub fn classify(&self, service: Service, err: &reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout {
                service,
                timeout_ms: self.timeout_ms(),
            }
        } else {
            ClientError::Transport {
                service,
                message: err.to_string(),
            }
        }
    }

    /// Send the request built by `build`, retrying retryable failures.
    ///
    /// `build` is called once per attempt. Non-success statuses are turned
    /// into [`ClientError::Status`] carrying the raw response body.
    pub async fn send<F>(&self, service: Service, build: F) -> Result<reqwest::Response, ClientError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 1;
        loop {
            let err = match build().timeout(self.timeout).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(resp),
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let body = error_body(service, status, resp).await;
                    ClientError::Status {
                        service,
                        status,
                        body,
                    }
                }
                Err(e) => self.classify(service, &e),
            };

            if attempt >= self.max_attempts || !err.is_retryable() {
                warn!(%service, attempt, kind = ?err.kind(), "Service call failed");
                return Err(err);
            }

            debug!(%service, attempt, %err, "Retrying service call");
            tokio::time::sleep(self.backoff).await;
            attempt += 1;
        }
    }

    /// Read the full response body as text, mapping read failures.
    pub async fn text(&self, service: Service, resp: reqwest::Response) -> Result<String, ClientError> {
        resp.text().await.map_err(|e| self.classify(service, &e))
    }

    /// Read the full response body as bytes, mapping read failures.
    pub async fn bytes(&self, service: Service, resp: reqwest::Response) -> Result<Vec<u8>, ClientError> {
        resp.bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| self.classify(service, &e))
    }
}

/// Body of a non-success response, or empty when it cannot be read.
async fn error_body(service: Service, status: u16, resp: reqwest::Response) -> String {
    match resp.text().await {
        Ok(body) => body,
        Err(e) => {
            warn!(%service, status, error = %e, "Could not read error response body");
            String::new()
        }
    }
}
