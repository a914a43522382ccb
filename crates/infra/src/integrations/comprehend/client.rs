//! HTTP client for the PII classification and detection APIs

use std::time::Duration;

use async_trait::async_trait;
use piiguard_core::{ClassificationResponse, Classifier, DetectionResponse, Detector};
use piiguard_domain::constants::{
    API_CONTAINS_PII_ENTITIES, API_DETECT_PII_ENTITIES, SERVICE_COMPREHEND,
};
use piiguard_domain::{PiiGuardError, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::types::{
    ContainsPiiEntitiesResponse, DetectPiiEntitiesResponse, PiiTextRequest, ServiceErrorBody,
};
use crate::config::ServiceConfig;
use crate::http::HttpClient;

const TARGET_PREFIX: &str = "Comprehend_20171127";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
pub const HEADER_TARGET: &str = "X-Amz-Target";
pub const HEADER_SESSION_ID: &str = "x-amzn-session-id";

/// Client implementing both [`Classifier`] and [`Detector`]
///
/// Retries are handled by the wrapped [`HttpClient`]; the number it needed
/// is reported back as `retry_attempts`.
#[derive(Debug, Clone)]
pub struct HttpPiiServiceClient {
    http_client: HttpClient,
    endpoint: String,
    session_id: String,
}

impl HttpPiiServiceClient {
    /// Create a client for `endpoint` with a random session id
    pub fn new(endpoint: impl Into<String>, http_client: HttpClient) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
            session_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Build from configuration
    ///
    /// # Errors
    /// Returns `PiiGuardError::Configuration` if no endpoint is configured or
    /// the HTTP client cannot be built.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| PiiGuardError::configuration("PII service endpoint is not configured"))?;

        let http_client = HttpClient::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .max_attempts(config.max_attempts)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self::new(endpoint, http_client))
    }

    /// Tag every call with `session_id`, typically the request id
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn call<T: DeserializeOwned>(
        &self,
        api: &str,
        text: &str,
        language_code: &str,
    ) -> Result<(T, u32)> {
        let request = self
            .http_client
            .request(Method::POST, &self.endpoint)
            .header("Content-Type", CONTENT_TYPE)
            .header(HEADER_TARGET, format!("{TARGET_PREFIX}.{api}"))
            .header(HEADER_SESSION_ID, self.session_id.as_str())
            .json(&PiiTextRequest { text, language_code });

        let sent = self
            .http_client
            .send(request)
            .await
            .map_err(|err| PiiGuardError::external_service(SERVICE_COMPREHEND, api, err.to_string()))?;

        let status = sent.response.status();
        debug!(api, status = status.as_u16(), retries = sent.retries, "received PII service response");

        if !status.is_success() {
            let body: ServiceErrorBody = sent.response.json().await.unwrap_or_default();
            warn!(api, status = status.as_u16(), "PII service call failed");
            return Err(PiiGuardError::external_service(
                SERVICE_COMPREHEND,
                api,
                format!("status {}: {}", status.as_u16(), body.describe()),
            ));
        }

        let parsed = sent.response.json::<T>().await.map_err(|e| {
            PiiGuardError::external_service(SERVICE_COMPREHEND, api, format!("invalid response: {e}"))
        })?;
        Ok((parsed, sent.retries))
    }
}

#[async_trait]
impl Classifier for HttpPiiServiceClient {
    async fn classify_presence(
        &self,
        text: &str,
        language_code: &str,
    ) -> Result<ClassificationResponse> {
        let (response, retry_attempts) = self
            .call::<ContainsPiiEntitiesResponse>(API_CONTAINS_PII_ENTITIES, text, language_code)
            .await?;

        Ok(ClassificationResponse {
            labels: response.labels.into_iter().map(|label| (label.name, label.score)).collect(),
            retry_attempts,
        })
    }
}

#[async_trait]
impl Detector for HttpPiiServiceClient {
    async fn detect_entities(&self, text: &str, language_code: &str) -> Result<DetectionResponse> {
        let (response, retry_attempts) = self
            .call::<DetectPiiEntitiesResponse>(API_DETECT_PII_ENTITIES, text, language_code)
            .await?;

        Ok(DetectionResponse { entities: response.entities, retry_attempts })
    }
}
