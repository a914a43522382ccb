use std::time::Duration;

use piiguard_domain::PiiGuardError;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use tracing::debug;

use crate::errors::InfraError;

/// A response together with the number of retries it took
#[derive(Debug)]
pub struct RetriedResponse {
    pub response: Response,
    pub retries: u32,
}

/// HTTP client with built-in retry and timeout support.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, PiiGuardError> {
        Self::builder().build()
    }

    pub const fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder with retry semantics.
    ///
    /// Throttling (429) and server errors are retried until attempts run
    /// out, after which the last response is returned as is. Retryable
    /// transport errors are retried the same way.
    ///
    /// # Errors
    /// Returns `PiiGuardError::Internal` for transport failures and
    /// `PiiGuardError::Configuration` for requests that cannot be built.
    pub async fn send(&self, builder: RequestBuilder) -> Result<RetriedResponse, PiiGuardError> {
        let attempts = self.max_attempts.max(1);
        let mut retries = 0u32;

        for attempt in 0..attempts {
            let cloned_builder = builder.try_clone().ok_or_else(|| {
                PiiGuardError::internal(
                    "request body cannot be cloned; buffer the body to enable retries",
                )
            })?;

            let request = cloned_builder.build().map_err(|err| PiiGuardError::from(InfraError::from(err)))?;

            let method = request.method().clone();
            let path = request.url().path().to_string();
            debug!(attempt = attempt + 1, %method, %path, "sending HTTP request");

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt = attempt + 1, %method, %path, %status, "received HTTP response");

                    if is_retryable_status(status) && attempt + 1 < attempts {
                        retries += 1;
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }

                    return Ok(RetriedResponse { response, retries });
                }
                Err(err) => {
                    let err = err.without_url();
                    debug!(attempt = attempt + 1, %method, %path, error = %err, "HTTP request failed");

                    if attempt + 1 < attempts && should_retry_error(&err) {
                        retries += 1;
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }

                    return Err(PiiGuardError::from(InfraError::from(err)));
                }
            }
        }

        Err(PiiGuardError::internal("http client exhausted retries without producing a result"))
    }

    /// Delay before retry number `retry_number` (1-based), doubling each time
    pub fn backoff_delay(&self, retry_number: usize) -> Duration {
        let shift = u32::try_from(retry_number.saturating_sub(1).min(8)).unwrap_or(8);
        let multiplier = 1u32 << shift;
        self.base_backoff.saturating_mul(multiplier)
    }

    pub async fn sleep_with_backoff(&self, retry_number: usize) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
            user_agent: None,
            default_headers: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn build(self) -> Result<HttpClient, PiiGuardError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| PiiGuardError::from(InfraError::from(err)))?;

        Ok(HttpClient {
            client,
            max_attempts: self.max_attempts.max(1),
            base_backoff: self.base_backoff,
        })
    }
}

/// Throttling and server-side failures
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

pub(crate) fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_request() || err.is_connect()
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use reqwest::{Method, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_with_defaults() -> HttpClient {
        HttpClient::builder()
            .base_backoff(Duration::from_millis(10))
            .max_attempts(3)
            .build()
            .expect("http client")
    }

    #[tokio::test]
    async fn test_returns_successful_response_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let sent = client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(sent.response.status(), StatusCode::OK);
        assert_eq!(sent.retries, 0);
    }

    #[tokio::test]
    async fn test_retries_throttling_and_server_errors_until_success() {
        let server = MockServer::start().await;
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        Mock::given(method("POST"))
            .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
                match attempts_clone.fetch_add(1, Ordering::SeqCst) {
                    0 => ResponseTemplate::new(429),
                    1 => ResponseTemplate::new(503),
                    _ => ResponseTemplate::new(200),
                }
            })
            .expect(3)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let sent = client
            .send(client.request(Method::POST, server.uri()).body("{}"))
            .await
            .expect("response");

        assert_eq!(sent.response.status(), StatusCode::OK);
        assert_eq!(sent.retries, 2);
    }

    #[tokio::test]
    async fn test_returns_last_response_when_attempts_run_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let sent = client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(sent.response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(sent.retries, 2);
    }

    #[tokio::test]
    async fn test_does_not_retry_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let sent = client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(sent.response.status(), StatusCode::NOT_FOUND);
        assert_eq!(sent.retries, 0);
    }

    #[tokio::test]
    async fn test_retries_on_network_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so that requests fail with ECONNREFUSED
        let url = format!("http://{addr}");

        let client = HttpClient::builder()
            .base_backoff(Duration::from_millis(5))
            .max_attempts(2)
            .build()
            .expect("http client");

        let result = client.send(client.request(Method::GET, &url)).await;
        match result {
            Err(PiiGuardError::Internal(msg)) => assert!(msg.starts_with("http ")),
            other => panic!("expected internal error, got {other:?}"),
        }
    }

    #[test]
    fn test_backoff_doubles_per_retry() {
        let client = client_with_defaults();
        assert_eq!(client.backoff_delay(1), Duration::from_millis(10));
        assert_eq!(client.backoff_delay(2), Duration::from_millis(20));
        assert_eq!(client.backoff_delay(4), Duration::from_millis(80));
    }
}
