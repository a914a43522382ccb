//! # PiiGuard Domain
//!
//! Domain types for PII segmentation, classification and redaction.
//!
//! This crate contains:
//! - The document model (`Document`, `Annotation`)
//! - Per-invocation configuration (`PiiConfig`, `RedactionConfig`)
//! - The closed error taxonomy and Result definition
//! - Domain constants (service limits, metric names, defaults)
//!
//! ## Architecture
//! - Depends only on the foundation tier of `piiguard-common`
//! - Pure data structures, no I/O and no ambient state

pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
