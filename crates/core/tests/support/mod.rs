//! Shared test helpers for `piiguard-core` integration tests.
//!
//! Provides in-memory fakes for the classifier, detector and metrics ports
//! so pipeline tests can focus on behaviour instead of boilerplate.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use piiguard_common::{MetricDatum, MetricsResult};
use piiguard_core::{
    ClassificationOrchestrator, ClassificationResponse, Classifier, DetectionResponse, Detector,
    MetricsSink,
};
use piiguard_domain::{Annotation, PiiGuardError, Result as DomainResult};

/// Text in which the keyword fakes find a name and a card number
pub const STATEMENT: &str = "Hello Zhang Wei. Your AnyCompany Financial Services, LLC credit card \
                             account 1111-0000-1111-0000 has a minimum payment of $24.53";

/// A literal string the fakes report as an entity
#[derive(Debug, Clone)]
pub struct Keyword {
    pub needle: String,
    pub entity_type: String,
    pub score: f64,
}

impl Keyword {
    pub fn new(needle: &str, entity_type: &str, score: f64) -> Self {
        Self { needle: needle.to_string(), entity_type: entity_type.to_string(), score }
    }
}

pub fn statement_keywords() -> Vec<Keyword> {
    vec![
        Keyword::new("Zhang Wei", "NAME", 0.8),
        Keyword::new("1111-0000-1111-0000", "CREDIT_DEBIT_NUMBER", 0.9),
    ]
}

/// Classifier and detector that recognise fixed keywords
///
/// Chunks containing `fail_on` fail with an external service error. Every
/// call sleeps for `delay` first.
#[derive(Default)]
pub struct KeywordService {
    keywords: Vec<Keyword>,
    delay: Duration,
    fail_on: Option<String>,
    pub classify_calls: AtomicUsize,
    pub detect_calls: AtomicUsize,
    retry_attempts: u32,
}

impl KeywordService {
    pub fn new(keywords: Vec<Keyword>) -> Self {
        Self { keywords, ..Self::default() }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_on = Some(marker.to_string());
        self
    }

    pub fn with_retry_attempts(mut self, retry_attempts: u32) -> Self {
        self.retry_attempts = retry_attempts;
        self
    }

    pub fn classify_calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }

    pub fn detect_calls(&self) -> usize {
        self.detect_calls.load(Ordering::SeqCst)
    }

    async fn pause_or_fail(&self, text: &str, api: &str) -> DomainResult<()> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.fail_on {
            Some(marker) if text.contains(marker.as_str()) => {
                Err(PiiGuardError::external_service("Comprehend", api, "simulated failure"))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Classifier for KeywordService {
    async fn classify_presence(
        &self,
        text: &str,
        _language_code: &str,
    ) -> DomainResult<ClassificationResponse> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        self.pause_or_fail(text, "ContainsPiiEntities").await?;

        let labels: BTreeMap<String, f64> = self
            .keywords
            .iter()
            .filter(|keyword| text.contains(keyword.needle.as_str()))
            .map(|keyword| (keyword.entity_type.clone(), keyword.score))
            .collect();
        Ok(ClassificationResponse { labels, retry_attempts: self.retry_attempts })
    }
}

#[async_trait]
impl Detector for KeywordService {
    async fn detect_entities(
        &self,
        text: &str,
        _language_code: &str,
    ) -> DomainResult<DetectionResponse> {
        self.detect_calls.fetch_add(1, Ordering::SeqCst);
        self.pause_or_fail(text, "DetectPiiEntities").await?;

        let mut entities = Vec::new();
        for keyword in &self.keywords {
            for (byte_index, _) in text.match_indices(keyword.needle.as_str()) {
                let begin = text[..byte_index].chars().count();
                let end = begin + keyword.needle.chars().count();
                entities.push(Annotation::new(keyword.entity_type.clone(), begin, end, keyword.score));
            }
        }
        entities.sort_by_key(|entity| entity.begin_offset);
        Ok(DetectionResponse { entities, retry_attempts: self.retry_attempts })
    }
}

/// Metrics sink that keeps every datum
#[derive(Default)]
pub struct RecordingMetrics {
    data: Mutex<Vec<MetricDatum>>,
}

impl RecordingMetrics {
    pub fn count(&self, metric_name: &str) -> usize {
        self.data().iter().filter(|datum| datum.metric_name == metric_name).count()
    }

    pub fn data(&self) -> Vec<MetricDatum> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl MetricsSink for RecordingMetrics {
    fn record(&self, datum: MetricDatum) -> MetricsResult<()> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner).push(datum);
        Ok(())
    }
}

/// Orchestrator backed by one service for both ports
pub fn orchestrator(
    service: Arc<KeywordService>,
    workers: usize,
    metrics: Arc<RecordingMetrics>,
) -> ClassificationOrchestrator {
    ClassificationOrchestrator::new(service.clone(), service, workers, workers)
        .expect("valid worker counts")
        .with_metrics(metrics)
}
