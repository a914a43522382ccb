//! Presigned URL download of the source object
//!
//! Presigned downloads do not always report failures through the status
//! line: an XML error document may arrive with `200 OK`. Every response is
//! therefore inspected for an `<Error>` body before it is accepted.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use piiguard_core::{MetricsSink, NoOpMetricsSink, SourceDocument, TextSource};
use piiguard_domain::constants::{API_DOWNLOAD_PRESIGNED_URL, SERVICE_S3};
use piiguard_domain::{PiiGuardError, Result};
use regex::Regex;
use reqwest::header::{HeaderMap, CONTENT_LENGTH};
use reqwest::Method;
use tracing::{debug, error, info, instrument, warn};

use super::error_codes::{resolve_error_code, INTERNAL_ERROR};
use crate::errors::InfraError;
use crate::http::HttpClient;

/// Total download attempts, including the first
pub const DOWNLOAD_MAX_ATTEMPTS: usize = 5;
/// Per-attempt timeout of a download
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

static ERROR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<Error>(.*)</Error>").expect("ERROR_RE should compile - this is a bug")
});
static CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<Code>(.*?)</Code>").expect("CODE_RE should compile - this is a bug")
});
static MESSAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<Message>(.*?)</Message>").expect("MESSAGE_RE should compile - this is a bug")
});

/// [`TextSource`] that downloads from presigned URLs
pub struct HttpTextSource {
    http_client: HttpClient,
    max_document_bytes: u64,
    max_attempts: usize,
    metrics: Arc<dyn MetricsSink>,
}

impl HttpTextSource {
    /// Create a source rejecting documents above `max_document_bytes`
    ///
    /// # Errors
    /// Returns `PiiGuardError::Configuration` if the HTTP client cannot be
    /// built.
    pub fn new(max_document_bytes: u64) -> Result<Self> {
        // Retries are driven here, not by the client: a retry decision
        // needs the parsed body.
        let http_client = HttpClient::builder().timeout(DOWNLOAD_TIMEOUT).max_attempts(1).build()?;
        Ok(Self::with_http_client(http_client, max_document_bytes))
    }

    /// Use a preconfigured client; its backoff paces the download retries
    pub fn with_http_client(http_client: HttpClient, max_document_bytes: u64) -> Self {
        Self {
            http_client,
            max_document_bytes,
            max_attempts: DOWNLOAD_MAX_ATTEMPTS,
            metrics: Arc::new(NoOpMetricsSink),
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    fn record_fault(&self) {
        if let Err(e) = self.metrics.record_fault(SERVICE_S3, API_DOWNLOAD_PRESIGNED_URL, 1) {
            warn!(error = %e, "failed to record download fault");
        }
    }

    fn record_latency(&self, elapsed: Duration) {
        if let Err(e) = self.metrics.record_latency(SERVICE_S3, API_DOWNLOAD_PRESIGNED_URL, elapsed) {
            warn!(error = %e, "failed to record download latency");
        }
    }

    fn check_size(&self, size: u64) -> Result<()> {
        if size > self.max_document_bytes {
            return Err(PiiGuardError::SizeLimitExceeded { size, limit: self.max_document_bytes });
        }
        Ok(())
    }

    /// Read the body chunk by chunk, never holding more than one chunk past
    /// the size limit
    ///
    /// A successful response over the limit is `SizeLimitExceeded`. Error
    /// bodies are cut off at the limit instead.
    async fn read_body(&self, response: &mut reqwest::Response, enforce_limit: bool) -> Result<Vec<u8>> {
        let mut body = Vec::new();
        while let Some(chunk) =
            response.chunk().await.map_err(|e| PiiGuardError::from(InfraError::from(e)))?
        {
            body.extend_from_slice(&chunk);
            if body.len() as u64 > self.max_document_bytes {
                if enforce_limit {
                    self.check_size(body.len() as u64)?;
                }
                body.truncate(usize::try_from(self.max_document_bytes).unwrap_or(usize::MAX));
                break;
            }
        }
        Ok(body)
    }
}

#[async_trait]
impl TextSource for HttpTextSource {
    #[instrument(skip_all)]
    async fn download(
        &self,
        locator: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<SourceDocument> {
        for attempt in 0..self.max_attempts {
            let last_attempt = attempt + 1 == self.max_attempts;
            let mut request = self.http_client.request(Method::GET, locator);
            for (name, value) in headers {
                request = request.header(name.as_str(), value.as_str());
            }

            let started = Instant::now();
            let body = match self.http_client.send(request).await {
                Ok(sent) => {
                    let mut response = sent.response;
                    let status = response.status().as_u16();
                    let response_headers = collect_headers(response.headers());
                    let success = is_success(status);

                    if success {
                        if let Some(length) = content_length(response.headers()) {
                            self.check_size(length)?;
                        }
                    }

                    self.read_body(&mut response, success)
                        .await
                        .map(|bytes| (status, response_headers, bytes))
                }
                Err(e) => Err(e),
            };

            let (status, response_headers, bytes) = match body {
                Ok(body) => body,
                Err(e @ PiiGuardError::SizeLimitExceeded { .. }) => return Err(e),
                Err(e) => {
                    warn!(attempt = attempt + 1, error = %e, "download attempt failed");
                    if last_attempt {
                        self.record_fault();
                        return Err(e);
                    }
                    self.http_client.sleep_with_backoff(attempt + 1).await;
                    continue;
                }
            };

            if let Some((code, message)) = detect_error(status, &bytes) {
                let (mapped_status, _) = resolve_error_code(&code);
                error!(%code, %message, status, mapped_status, "error downloading file from presigned url");
                if !RETRYABLE_STATUSES.contains(&mapped_status) || last_attempt {
                    self.record_fault();
                    return Err(PiiGuardError::source_fetch(code, message));
                }
                self.http_client.sleep_with_backoff(attempt + 1).await;
                continue;
            }

            self.check_size(bytes.len() as u64)?;
            let text = match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(e) => {
                    info!(bytes = e.as_bytes().len(), "downloaded content is not valid utf-8");
                    return Err(PiiGuardError::unsupported_input(
                        "Not a valid utf-8 file",
                        e.into_bytes(),
                        response_headers,
                    ));
                }
            };

            self.record_latency(started.elapsed());
            debug!(attempt = attempt + 1, bytes = text.len(), "downloaded source document");
            return Ok(SourceDocument { text, headers: response_headers, status_code: status });
        }

        Err(PiiGuardError::internal("download exhausted retries without producing a result"))
    }
}

/// Remote error carried by a response, as `(code, message)`
///
/// Only non-2xx responses and bodies starting with the XML declaration are
/// inspected. A non-2xx response without a parsable error body is an
/// `InternalError`.
fn detect_error(status: u16, body: &[u8]) -> Option<(String, String)> {
    let text = String::from_utf8_lossy(body);
    let starts_with_xml = text.split('\n').next().map(str::trim_end) == Some(XML_HEADER);
    if is_success(status) && !starts_with_xml {
        return None;
    }

    let captured = |re: &Regex| re.captures(&text).and_then(|c| c.get(1)).map(|m| m.as_str().to_string());
    match (captured(&ERROR_RE), captured(&CODE_RE), captured(&MESSAGE_RE)) {
        (Some(_), Some(code), Some(message)) => Some((code, message)),
        _ if !is_success(status) => Some((INTERNAL_ERROR.to_string(), "Internal Server Error".to_string())),
        _ => None,
    }
}

/// `200 OK` for whole objects, `206 Partial Content` for ranges and parts
const fn is_success(status: u16) -> bool {
    matches!(status, 200..=299)
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers.get(CONTENT_LENGTH)?.to_str().ok()?.trim().parse().ok()
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect()
}
