//! Concurrent fan-out of classification and detection calls
//!
//! Every document of a batch is cloned and moved into its own task. The task
//! waits for a slot in the bounded pool of its call site, calls the external
//! service and hands the annotated document back. Results are collected in
//! completion order.
//!
//! The first failure fails the batch, but the batch only returns once every
//! spawned call has finished. Nothing in flight is cancelled.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use piiguard_common::{ResilienceError, WorkerPool, WorkerPoolMetrics};
use piiguard_domain::constants::{
    API_CONTAINS_PII_ENTITIES, API_DETECT_PII_ENTITIES, SERVICE_COMPREHEND,
};
use piiguard_domain::{Document, PiiGuardError, Result};
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use super::ports::{ClassificationResponse, Classifier, DetectionResponse, Detector};
use crate::metrics_ports::{MetricsSink, NoOpMetricsSink};

/// Runs batches of classify/detect calls on two independently sized pools
pub struct ClassificationOrchestrator {
    classifier: Arc<dyn Classifier>,
    detector: Arc<dyn Detector>,
    metrics: Arc<dyn MetricsSink>,
    classification_pool: WorkerPool,
    detection_pool: WorkerPool,
}

impl ClassificationOrchestrator {
    /// Create an orchestrator with the given pool sizes
    ///
    /// # Errors
    /// Returns `PiiGuardError::Configuration` if either worker count is zero.
    pub fn new(
        classifier: Arc<dyn Classifier>,
        detector: Arc<dyn Detector>,
        classification_workers: usize,
        detection_workers: usize,
    ) -> Result<Self> {
        let classification_pool = WorkerPool::with_workers(API_CONTAINS_PII_ENTITIES, classification_workers)
            .map_err(PiiGuardError::configuration)?;
        let detection_pool = WorkerPool::with_workers(API_DETECT_PII_ENTITIES, detection_workers)
            .map_err(PiiGuardError::configuration)?;

        Ok(Self {
            classifier,
            detector,
            metrics: Arc::new(NoOpMetricsSink),
            classification_pool,
            detection_pool,
        })
    }

    /// Record call latency and fault counts to `metrics`
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn classification_pool_metrics(&self) -> WorkerPoolMetrics {
        self.classification_pool.metrics()
    }

    pub fn detection_pool_metrics(&self) -> WorkerPoolMetrics {
        self.detection_pool.metrics()
    }

    /// Fill `pii_classification` on a copy of every document
    ///
    /// The returned order is completion order, not input order.
    ///
    /// # Errors
    /// The first error reported by any call, after all calls have finished.
    #[instrument(skip_all, fields(documents = documents.len(), language = language_code))]
    pub async fn classify_batch(
        &self,
        documents: &[Document],
        language_code: &str,
    ) -> Result<Vec<Document>> {
        let classifier = Arc::clone(&self.classifier);
        let metrics = Arc::clone(&self.metrics);
        let language_code = language_code.to_string();

        self.run_batch(&self.classification_pool, documents, move |mut document| {
            let classifier = Arc::clone(&classifier);
            let metrics = Arc::clone(&metrics);
            let language_code = language_code.clone();
            async move {
                let response = observed_call(
                    metrics.as_ref(),
                    API_CONTAINS_PII_ENTITIES,
                    classifier.classify_presence(&document.text, &language_code),
                    |_: &ClassificationResponse| None,
                )
                .await?;
                document.pii_classification = response.labels;
                Ok(document)
            }
        })
        .await
    }

    /// Fill `pii_entities` on a copy of every document and fold the entity
    /// scores into its classification (maximum per type)
    ///
    /// The returned order is completion order, not input order.
    ///
    /// # Errors
    /// The first error reported by any call, after all calls have finished.
    #[instrument(skip_all, fields(documents = documents.len(), language = language_code))]
    pub async fn detect_batch(
        &self,
        documents: &[Document],
        language_code: &str,
    ) -> Result<Vec<Document>> {
        let detector = Arc::clone(&self.detector);
        let metrics = Arc::clone(&self.metrics);
        let language_code = language_code.to_string();

        self.run_batch(&self.detection_pool, documents, move |mut document| {
            let detector = Arc::clone(&detector);
            let metrics = Arc::clone(&metrics);
            let language_code = language_code.clone();
            async move {
                let response = observed_call(
                    metrics.as_ref(),
                    API_DETECT_PII_ENTITIES,
                    detector.detect_entities(&document.text, &language_code),
                    |response: &DetectionResponse| Some(response.retry_attempts),
                )
                .await?;
                for entity in &response.entities {
                    document.merge_score(&entity.entity_type, entity.score);
                }
                document.pii_entities = response.entities;
                Ok(document)
            }
        })
        .await
    }

    async fn run_batch<F, Fut>(
        &self,
        pool: &WorkerPool,
        documents: &[Document],
        call: F,
    ) -> Result<Vec<Document>>
    where
        F: Fn(Document) -> Fut,
        Fut: Future<Output = Result<Document>> + Send + 'static,
    {
        let mut tasks = JoinSet::new();
        for document in documents.iter().cloned() {
            let pool = pool.clone();
            let work = call(document);
            tasks.spawn(async move { pool.execute(move || work).await });
        }

        let mut processed = Vec::with_capacity(documents.len());
        let mut first_error = None;

        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(result) => result.map_err(from_pool_error),
                Err(join_error) => Err(PiiGuardError::internal(format!(
                    "{} worker stopped: {join_error}",
                    pool.name()
                ))),
            };

            match (outcome, first_error.is_some()) {
                (Ok(document), false) => processed.push(document),
                (Ok(_), true) => debug!(pool = pool.name(), "dropping result of failed batch"),
                (Err(error), false) => {
                    warn!(pool = pool.name(), error = %error, "batch call failed, draining remaining calls");
                    first_error = Some(error);
                }
                (Err(error), true) => debug!(pool = pool.name(), error = %error, "additional batch failure"),
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => {
                debug!(pool = pool.name(), documents = processed.len(), "batch complete");
                Ok(processed)
            }
        }
    }
}

/// Await one external call, recording its latency and fault count
///
/// A failed call records one fault. A successful call records whatever
/// `success_faults` reports, if anything.
async fn observed_call<T, Fut>(
    metrics: &dyn MetricsSink,
    api: &str,
    call: Fut,
    success_faults: fn(&T) -> Option<u32>,
) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    let started = Instant::now();
    let outcome = call.await;

    if let Err(error) = metrics.record_latency(SERVICE_COMPREHEND, api, started.elapsed()) {
        warn!(api, error = %error, "failed to record latency");
    }
    let faults = match &outcome {
        Ok(response) => success_faults(response),
        Err(_) => Some(1),
    };
    if let Some(faults) = faults {
        if let Err(error) = metrics.record_fault(SERVICE_COMPREHEND, api, faults) {
            warn!(api, error = %error, "failed to record fault count");
        }
    }

    outcome
}

fn from_pool_error(error: ResilienceError<PiiGuardError>) -> PiiGuardError {
    match error {
        ResilienceError::OperationFailed { source } => source,
        other => PiiGuardError::internal(other.to_string()),
    }
}
