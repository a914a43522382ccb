//! Port interfaces for PII classification and entity detection

use std::collections::BTreeMap;

use async_trait::async_trait;
use piiguard_domain::{Annotation, Result};

/// Result of a coarse "does this text contain PII" call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationResponse {
    /// Score per entity type
    pub labels: BTreeMap<String, f64>,
    /// Retries the adapter needed before the call succeeded
    pub retry_attempts: u32,
}

/// Result of a fine-grained entity detection call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionResponse {
    /// Entity spans with chunk-local offsets
    pub entities: Vec<Annotation>,
    /// Retries the adapter needed before the call succeeded
    pub retry_attempts: u32,
}

/// Trait for scoring which PII entity types a text contains
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify one chunk of text
    ///
    /// Implementations apply their own retry policy; an error means the call
    /// is not recoverable.
    async fn classify_presence(
        &self,
        text: &str,
        language_code: &str,
    ) -> Result<ClassificationResponse>;
}

/// Trait for locating PII entity spans in a text
#[async_trait]
pub trait Detector: Send + Sync {
    /// Detect entities in one chunk of text
    async fn detect_entities(&self, text: &str, language_code: &str) -> Result<DetectionResponse>;
}
