//! Per-document pipelines: access-control classification and redaction
//!
//! ```text
//! segment ─▶ classify_batch ─┬─ no interested PII ─▶ de_segment ─▶ done
//!                            └─ interested PII ─▶ segment (finer) ─▶ detect_batch
//!                                                 ─▶ de_segment ─▶ redact ─▶ done
//! ```
//!
//! Settings are resolved by the caller; nothing here reads the environment.

pub mod deadline;

use std::collections::BTreeSet;

use piiguard_domain::constants::{
    DEFAULT_CLASSIFICATION_CHUNK_BYTES, DEFAULT_DETECTION_CHUNK_BYTES, DEFAULT_MAX_OVERLAP_CHARS,
    DEFAULT_OVERLAP_TOKENS,
};
use piiguard_domain::{ClassificationConfig, Document, PiiGuardError, RedactionConfig, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

pub use deadline::within_deadline;

use crate::classification::ClassificationOrchestrator;
use crate::redaction::Redactor;
use crate::segmentation::{de_segment, Segmenter};

/// Chunk sizes and overlap used by both pipeline stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationSettings {
    /// Largest chunk sent to the classifier, in bytes
    pub classification_chunk_bytes: usize,
    /// Largest chunk sent to the detector, in bytes
    pub detection_chunk_bytes: usize,
    pub overlap_tokens: usize,
    pub max_overlap_chars: usize,
}

impl Default for SegmentationSettings {
    fn default() -> Self {
        Self {
            classification_chunk_bytes: DEFAULT_CLASSIFICATION_CHUNK_BYTES,
            detection_chunk_bytes: DEFAULT_DETECTION_CHUNK_BYTES,
            overlap_tokens: DEFAULT_OVERLAP_TOKENS,
            max_overlap_chars: DEFAULT_MAX_OVERLAP_CHARS,
        }
    }
}

/// Classification and redaction over a shared orchestrator
pub struct PiiPipeline {
    orchestrator: ClassificationOrchestrator,
    classification_segmenter: Segmenter,
    detection_segmenter: Segmenter,
    detection_only: bool,
}

impl PiiPipeline {
    /// Build segmenters from `settings`
    ///
    /// # Errors
    /// Returns `PiiGuardError::Configuration` if a chunk size is below 4
    /// bytes.
    pub fn new(orchestrator: ClassificationOrchestrator, settings: &SegmentationSettings) -> Result<Self> {
        Ok(Self {
            orchestrator,
            classification_segmenter: Segmenter::with_overlap(
                settings.classification_chunk_bytes,
                settings.overlap_tokens,
                settings.max_overlap_chars,
            )?,
            detection_segmenter: Segmenter::with_overlap(
                settings.detection_chunk_bytes,
                settings.overlap_tokens,
                settings.max_overlap_chars,
            )?,
            detection_only: false,
        })
    }

    /// Skip the classification pre-filter in `redact` and run detection over
    /// the whole text
    pub fn with_detection_only(mut self, detection_only: bool) -> Self {
        self.detection_only = detection_only;
        self
    }

    pub const fn orchestrator(&self) -> &ClassificationOrchestrator {
        &self.orchestrator
    }

    /// Interested entity types found anywhere in `text`
    ///
    /// Never calls detection.
    ///
    /// # Errors
    /// The first classifier failure.
    #[instrument(skip_all, fields(bytes = text.len(), language = language_code))]
    pub async fn classify(
        &self,
        text: &str,
        config: &ClassificationConfig,
        language_code: &str,
    ) -> Result<BTreeSet<String>> {
        let segments = self.classification_segmenter.segment(text, 0);
        let classified = self.orchestrator.classify_batch(&segments, language_code).await?;

        let interested: BTreeSet<String> = classified
            .iter()
            .flat_map(|document| config.interested_types(&document.pii_classification))
            .collect();

        info!(segments = segments.len(), interested = interested.len(), "classified document");
        Ok(interested)
    }

    /// Redact `text`, returning the redacted text with the merged
    /// classification and entity annotations
    ///
    /// # Errors
    /// - The first classifier or detector failure
    /// - `ReconstructionInvariant` if reassembly loses or duplicates text
    #[instrument(skip_all, fields(bytes = text.len(), language = language_code))]
    pub async fn redact(
        &self,
        text: &str,
        config: &RedactionConfig,
        language_code: &str,
    ) -> Result<Document> {
        let original_chars = text.chars().count();

        let (classified, candidates) = if self.detection_only {
            (Vec::new(), vec![Document::new(text)])
        } else {
            let segments = self.classification_segmenter.segment(text, 0);
            let classified = self.orchestrator.classify_batch(&segments, language_code).await?;
            let candidates: Vec<Document> = classified
                .iter()
                .filter(|document| has_interested_pii(document, config.pii()))
                .cloned()
                .collect();
            (classified, candidates)
        };

        if !self.detection_only && candidates.is_empty() {
            debug!(segments = classified.len(), "no interested PII, skipping detection");
            return check_reconstruction(de_segment(classified), original_chars);
        }

        let detection_segments: Vec<Document> = candidates
            .iter()
            .flat_map(|document| self.detection_segmenter.segment(&document.text, document.char_offset))
            .collect();
        let detected = self.orchestrator.detect_batch(&detection_segments, language_code).await?;

        let mut documents = classified;
        documents.extend(detected);
        let mut merged = check_reconstruction(de_segment(documents), original_chars)?;

        merged.text = Redactor::new(config.clone()).redact(&merged.text, &merged.pii_entities);
        info!(
            candidates = candidates.len(),
            detection_segments = detection_segments.len(),
            entities = merged.pii_entities.len(),
            "redacted document"
        );
        Ok(merged)
    }
}

fn has_interested_pii(document: &Document, config: &ClassificationConfig) -> bool {
    document
        .pii_classification
        .iter()
        .any(|(entity_type, score)| config.is_interested(entity_type, *score))
}

fn check_reconstruction(document: Document, expected: usize) -> Result<Document> {
    let actual = document.char_len();
    if actual == expected {
        Ok(document)
    } else {
        Err(PiiGuardError::ReconstructionInvariant { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_match_service_limits() {
        let settings = SegmentationSettings::default();
        assert_eq!(settings.classification_chunk_bytes, 5000);
        assert_eq!(settings.detection_chunk_bytes, 5000);
        assert_eq!(settings.overlap_tokens, 20);
        assert_eq!(settings.max_overlap_chars, 200);
    }

    #[test]
    fn test_reconstruction_length_mismatch_is_fatal() {
        let err = check_reconstruction(Document::new("abc"), 4).unwrap_err();
        assert!(matches!(err, PiiGuardError::ReconstructionInvariant { expected: 4, actual: 3 }));
    }

    #[test]
    fn test_partial_settings_take_defaults() {
        let settings: SegmentationSettings = serde_json::from_str(r#"{"detection_chunk_bytes": 300}"#).unwrap();
        assert_eq!(settings.detection_chunk_bytes, 300);
        assert_eq!(settings.classification_chunk_bytes, 5000);
    }
}
