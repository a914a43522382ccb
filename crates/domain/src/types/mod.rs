//! Domain types and models

pub mod config;
pub mod document;

pub use config::{
    ClassificationConfig, EntityTypeFilter, MaskMode, PiiConfig, RedactionConfig,
    UnsupportedFileHandling,
};
pub use document::{Annotation, Document, RelativePosition};
