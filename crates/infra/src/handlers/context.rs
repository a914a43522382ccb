//! Collaborators shared by the request handlers

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use piiguard_core::{
    ClassificationOrchestrator, Classifier, Detector, MetricsSink, PiiPipeline, ResponseSink,
    TextSource,
};
use piiguard_domain::constants::RESERVED_CLEANUP_MS;
use piiguard_domain::{PiiGuardError, Result, UnsupportedFileHandling};
use tracing::debug;

use crate::config::AppConfig;
use crate::integrations::comprehend::HttpPiiServiceClient;
use crate::integrations::object_lambda::{HttpResponseSink, HttpTextSource};
use crate::observability::BufferedMetricsSink;

/// Object headers forwarded with a successful response
pub const FORWARDED_HEADERS: [&str; 1] = ["content-type"];

/// Configuration and adapters for one invocation
pub struct HandlerContext {
    config: AppConfig,
    unsupported_policy: UnsupportedFileHandling,
    source: Arc<dyn TextSource>,
    responder: Arc<dyn ResponseSink>,
    classifier: Arc<dyn Classifier>,
    detector: Arc<dyn Detector>,
    metrics: Arc<BufferedMetricsSink>,
}

impl HandlerContext {
    /// Assemble a context from explicit collaborators
    ///
    /// # Errors
    /// Returns `PiiGuardError::Configuration` if `config` is invalid.
    pub fn new(
        config: AppConfig,
        source: Arc<dyn TextSource>,
        responder: Arc<dyn ResponseSink>,
        classifier: Arc<dyn Classifier>,
        detector: Arc<dyn Detector>,
        metrics: Arc<BufferedMetricsSink>,
    ) -> Result<Self> {
        config.validate()?;
        let unsupported_policy = config.unsupported_file_policy()?;
        Ok(Self { config, unsupported_policy, source, responder, classifier, detector, metrics })
    }

    /// Build the HTTP adapters described by `config`
    ///
    /// `session_id` tags every PII service call of the invocation.
    ///
    /// # Errors
    /// Returns `PiiGuardError::Configuration` if `config` is invalid or an
    /// endpoint is missing.
    pub fn from_config(config: AppConfig, session_id: &str) -> Result<Self> {
        let metrics = Arc::new(BufferedMetricsSink::default());

        let object_endpoint = config
            .object_store
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| PiiGuardError::configuration("object store endpoint is not configured"))?;

        let source = HttpTextSource::new(config.limits.max_document_bytes)?
            .with_metrics(metrics.clone());
        let responder = HttpResponseSink::new(&object_endpoint)?.with_metrics(metrics.clone());
        let service = Arc::new(
            HttpPiiServiceClient::from_config(&config.service)?.with_session_id(session_id),
        );

        Self::new(config, Arc::new(source), Arc::new(responder), service.clone(), service, metrics)
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    pub const fn unsupported_policy(&self) -> UnsupportedFileHandling {
        self.unsupported_policy
    }

    pub fn source(&self) -> &dyn TextSource {
        self.source.as_ref()
    }

    pub fn responder(&self) -> &dyn ResponseSink {
        self.responder.as_ref()
    }

    pub fn metrics(&self) -> &BufferedMetricsSink {
        &self.metrics
    }

    /// A pipeline over fresh worker pools, recording into this context's
    /// metrics
    ///
    /// # Errors
    /// Returns `PiiGuardError::Configuration` for invalid pool or chunk sizes.
    pub fn pipeline(&self) -> Result<PiiPipeline> {
        let orchestrator = ClassificationOrchestrator::new(
            self.classifier.clone(),
            self.detector.clone(),
            self.config.concurrency.classification_workers,
            self.config.concurrency.detection_workers,
        )?
        .with_metrics(self.metrics.clone() as Arc<dyn MetricsSink>);

        Ok(PiiPipeline::new(orchestrator, &self.config.segmentation)?
            .with_detection_only(self.config.pipeline.detection_only))
    }

    /// Publish buffered metrics, or drop them if publishing is disabled
    pub fn flush_metrics(&self) {
        if self.config.metrics.publish {
            let published = self.metrics.flush();
            debug!(published, "published invocation metrics");
        } else {
            let dropped = self.metrics.clear();
            debug!(dropped, "metrics publishing disabled, dropped invocation metrics");
        }
    }
}

/// Budget left for the pipeline once cleanup time is reserved
pub fn pipeline_budget(remaining: Duration) -> Duration {
    remaining.saturating_sub(Duration::from_millis(RESERVED_CLEANUP_MS))
}

/// Pipeline budget left before `deadline`, measured now
pub fn budget_until(deadline: Instant) -> Duration {
    pipeline_budget(deadline.saturating_duration_since(Instant::now()))
}

/// The subset of source headers passed back with the response
pub fn forwarded_headers(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter(|(name, _)| FORWARDED_HEADERS.contains(&name.to_ascii_lowercase().as_str()))
        .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
        .collect()
}

/// Forwarded source headers plus a Content-Length for the body actually sent
pub fn response_headers(headers: &BTreeMap<String, String>, body_len: usize) -> BTreeMap<String, String> {
    let mut forwarded = forwarded_headers(headers);
    forwarded.insert("content-length".to_string(), body_len.to_string());
    forwarded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_reserves_cleanup_time() {
        assert_eq!(pipeline_budget(Duration::from_secs(10)), Duration::from_millis(8000));
        assert_eq!(pipeline_budget(Duration::from_millis(1500)), Duration::ZERO);
    }

    #[test]
    fn test_only_content_type_is_forwarded() {
        let headers: BTreeMap<String, String> = [
            ("Content-Type", "text/plain"),
            ("content-length", "42"),
            ("etag", "\"abc\""),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let forwarded = forwarded_headers(&headers);
        assert_eq!(forwarded.len(), 1);
        assert_eq!(forwarded["content-type"], "text/plain");
    }

    #[test]
    fn test_budget_until_counts_time_already_spent() {
        let deadline = Instant::now() + Duration::from_millis(2500);
        assert!(budget_until(deadline) <= Duration::from_millis(500));
        assert_eq!(budget_until(Instant::now()), Duration::ZERO);
    }

    #[test]
    fn test_content_length_is_recomputed_for_the_sent_body() {
        let headers: BTreeMap<String, String> =
            [("Content-Type", "text/plain"), ("Content-Length", "15")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();

        let sent = response_headers(&headers, 7);
        assert_eq!(sent["content-length"], "7");
        assert_eq!(sent["content-type"], "text/plain");
        assert_eq!(sent.len(), 2);
    }

    #[test]
    fn test_from_config_requires_endpoints() {
        let err = HandlerContext::from_config(AppConfig::default(), "req-1").err().unwrap();
        assert!(matches!(err, PiiGuardError::Configuration(_)));

        let mut config = AppConfig::default();
        config.object_store.endpoint = Some("http://127.0.0.1:9".into());
        config.service.endpoint = Some("http://127.0.0.1:9".into());
        assert!(HandlerContext::from_config(config, "req-1").is_ok());
    }
}
