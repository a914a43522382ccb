//! # PiiGuard Core
//!
//! The PII engine - no infrastructure dependencies.
//!
//! This crate contains:
//! - Segmentation and de-segmentation of large documents
//! - The redactor
//! - The classification orchestrator with bounded worker pools
//! - The `classify` and `redact` pipelines
//! - Port interfaces (traits) for classifiers, detectors, metrics and
//!   transports
//!
//! ## Architecture Principles
//! - Only depends on `piiguard-common` and `piiguard-domain`
//! - No HTTP, environment or file access
//! - All external collaborators via traits

pub mod classification;
pub mod pipeline;
pub mod redaction;
pub mod segmentation;

// Infrastructure ports
pub mod metrics_ports;
pub mod transport_ports;

pub use classification::ports::{ClassificationResponse, Classifier, DetectionResponse, Detector};
pub use classification::ClassificationOrchestrator;
pub use metrics_ports::{MetricsSink, NoOpMetricsSink};
pub use pipeline::{within_deadline, PiiPipeline, SegmentationSettings};
pub use redaction::Redactor;
pub use segmentation::{de_segment, Segmenter};
pub use transport_ports::{ResponseSink, ResponseTarget, SourceDocument, TextSource};
