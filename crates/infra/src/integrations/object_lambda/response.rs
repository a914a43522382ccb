//! `WriteGetObjectResponse` delivery of results and errors

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use piiguard_core::{MetricsSink, NoOpMetricsSink, ResponseSink, ResponseTarget};
use piiguard_domain::constants::{API_WRITE_GET_OBJECT_RESPONSE, SERVICE_S3};
use piiguard_domain::{PiiGuardError, Result};
use reqwest::{Method, RequestBuilder};
use tracing::{debug, error, instrument, warn};

use crate::http::HttpClient;

/// Total delivery attempts, including the first
pub const RESPONSE_MAX_ATTEMPTS: usize = 10;

pub const HEADER_REQUEST_ROUTE: &str = "x-amz-request-route";
pub const HEADER_REQUEST_TOKEN: &str = "x-amz-request-token";
pub const HEADER_FWD_STATUS: &str = "x-amz-fwd-status";
pub const HEADER_FWD_ERROR_CODE: &str = "x-amz-fwd-error-code";
pub const HEADER_FWD_ERROR_MESSAGE: &str = "x-amz-fwd-error-message";
/// Prefix of object headers forwarded to the caller
pub const HEADER_FWD_PREFIX: &str = "x-amz-fwd-header-";

/// [`ResponseSink`] posting to an Object Lambda `WriteGetObjectResponse`
/// endpoint
pub struct HttpResponseSink {
    http_client: HttpClient,
    url: String,
    metrics: Arc<dyn MetricsSink>,
}

impl HttpResponseSink {
    /// Create a sink for `endpoint` (scheme and host, no path)
    ///
    /// # Errors
    /// Returns `PiiGuardError::Configuration` if the HTTP client cannot be
    /// built.
    pub fn new(endpoint: &str) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .max_attempts(RESPONSE_MAX_ATTEMPTS)
            .build()?;
        Ok(Self::with_http_client(endpoint, http_client))
    }

    pub fn with_http_client(endpoint: &str, http_client: HttpClient) -> Self {
        Self {
            http_client,
            url: format!("{}/WriteGetObjectResponse", endpoint.trim_end_matches('/')),
            metrics: Arc::new(NoOpMetricsSink),
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    fn request(&self, target: &ResponseTarget, status_code: u16) -> RequestBuilder {
        self.http_client
            .request(Method::POST, &self.url)
            .header(HEADER_REQUEST_ROUTE, target.route.as_str())
            .header(HEADER_REQUEST_TOKEN, target.token.as_str())
            .header(HEADER_FWD_STATUS, status_code.to_string())
    }

    async fn deliver(&self, request: RequestBuilder) -> Result<()> {
        let started = Instant::now();
        let outcome = match self.http_client.send(request).await {
            Ok(sent) if sent.response.status().is_success() => {
                debug!(retries = sent.retries, "delivered response");
                Ok(())
            }
            Ok(sent) => {
                let status = sent.response.status();
                let body = sent.response.text().await.unwrap_or_default();
                Err(PiiGuardError::external_service(
                    SERVICE_S3,
                    API_WRITE_GET_OBJECT_RESPONSE,
                    format!("status {status}: {body}"),
                ))
            }
            Err(e) => Err(e),
        };

        match &outcome {
            Ok(()) => {
                if let Err(e) =
                    self.metrics.record_latency(SERVICE_S3, API_WRITE_GET_OBJECT_RESPONSE, started.elapsed())
                {
                    warn!(error = %e, "failed to record response latency");
                }
            }
            Err(e) => {
                error!(error = %e, "error occurred while calling WriteGetObjectResponse");
                if let Err(e) = self.metrics.record_fault(SERVICE_S3, API_WRITE_GET_OBJECT_RESPONSE, 1) {
                    warn!(error = %e, "failed to record response fault");
                }
            }
        }
        outcome
    }
}

#[async_trait]
impl ResponseSink for HttpResponseSink {
    #[instrument(skip_all, fields(bytes = body.len(), status_code = status_code))]
    async fn respond_with_data(
        &self,
        target: &ResponseTarget,
        body: Vec<u8>,
        headers: &BTreeMap<String, String>,
        status_code: u16,
    ) -> Result<()> {
        let mut request = self.request(target, status_code);
        for (name, value) in headers {
            request = request.header(format!("{HEADER_FWD_PREFIX}{name}"), value.as_str());
        }
        self.deliver(request.body(body)).await
    }

    #[instrument(skip_all, fields(status_code = status_code, error_code = error_code))]
    async fn respond_with_error(
        &self,
        target: &ResponseTarget,
        status_code: u16,
        error_code: &str,
        message: &str,
    ) -> Result<()> {
        let request = self
            .request(target, status_code)
            .header(HEADER_FWD_ERROR_CODE, error_code)
            .header(HEADER_FWD_ERROR_MESSAGE, message);
        self.deliver(request).await
    }
}
