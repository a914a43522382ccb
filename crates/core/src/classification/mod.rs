//! PII classification and entity detection

pub mod orchestrator;
pub mod ports;

pub use orchestrator::ClassificationOrchestrator;
pub use ports::*;
