//! Error types used throughout the engine and its adapters
//!
//! One closed enum covers every failure an invocation can surface. Boundary
//! layers match on it exhaustively to build caller-facing responses.

use std::collections::BTreeMap;

use piiguard_common::error::ErrorSeverity;
use piiguard_common::impl_error_classification;
use thiserror::Error;

/// Main error type for PiiGuard
#[derive(Error, Debug)]
pub enum PiiGuardError {
    /// Invalid threshold, segment size, worker count or request payload
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Content that cannot be decoded as text. Carries the raw bytes and
    /// response headers so the caller may pass them through unchanged.
    #[error("Unsupported input: {reason}")]
    UnsupportedInput { reason: String, content: Vec<u8>, headers: BTreeMap<String, String> },

    /// The document is larger than the configured maximum
    #[error("Document of {size} bytes exceeds the maximum supported size of {limit} bytes")]
    SizeLimitExceeded { size: u64, limit: u64 },

    /// A classifier/detector call failed after its own retries
    #[error("{service} {api} call failed: {message}")]
    ExternalService { service: String, api: String, message: String },

    /// De-segmented text does not match the original length
    #[error("Reconstructed document has {actual} characters, expected {expected}")]
    ReconstructionInvariant { expected: usize, actual: usize },

    /// The pipeline did not finish within its budget
    #[error("Processing did not finish within {budget_ms} ms")]
    DeadlineExceeded { budget_ms: u64 },

    /// Interested PII was found while running in access-control mode
    #[error("Document contains restricted PII: {}", entity_types.join(", "))]
    AccessRestricted { entity_types: Vec<String> },

    /// The source document could not be downloaded
    #[error("Failed to fetch source document ({code}): {message}")]
    SourceFetch { code: String, message: String },

    /// The incoming request is malformed or asks for something unsupported
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PiiGuardError {
    /// Build a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Build an external service error
    pub fn external_service(
        service: impl Into<String>,
        api: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ExternalService { service: service.into(), api: api.into(), message: message.into() }
    }

    /// Build an unsupported input error carrying the original payload
    pub fn unsupported_input(
        reason: impl Into<String>,
        content: Vec<u8>,
        headers: BTreeMap<String, String>,
    ) -> Self {
        Self::UnsupportedInput { reason: reason.into(), content, headers }
    }

    /// Build a source fetch error
    pub fn source_fetch(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceFetch { code: code.into(), message: message.into() }
    }

    /// Build an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Short, stable name of the error kind for logs and metrics
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::UnsupportedInput { .. } => "unsupported_input",
            Self::SizeLimitExceeded { .. } => "size_limit",
            Self::ExternalService { .. } => "external_service",
            Self::ReconstructionInvariant { .. } => "reconstruction_invariant",
            Self::DeadlineExceeded { .. } => "deadline_exceeded",
            Self::AccessRestricted { .. } => "access_restricted",
            Self::SourceFetch { .. } => "source_fetch",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Internal(_) => "internal",
        }
    }
}

impl_error_classification!(PiiGuardError,
    Self::Configuration(_) => {
        retryable: false,
        severity: ErrorSeverity::Error,
        critical: false,
    },
    Self::UnsupportedInput { .. } => {
        retryable: false,
        severity: ErrorSeverity::Warning,
        critical: false,
    },
    Self::SizeLimitExceeded { .. } => {
        retryable: false,
        severity: ErrorSeverity::Warning,
        critical: false,
    },
    Self::ExternalService { .. } => {
        retryable: true,
        severity: ErrorSeverity::Error,
        critical: false,
    },
    Self::ReconstructionInvariant { .. } => {
        retryable: false,
        severity: ErrorSeverity::Critical,
        critical: true,
    },
    Self::DeadlineExceeded { .. } => {
        retryable: true,
        severity: ErrorSeverity::Warning,
        critical: false,
    },
    Self::AccessRestricted { .. } => {
        retryable: false,
        severity: ErrorSeverity::Info,
        critical: false,
    },
    Self::SourceFetch { .. } => {
        retryable: false,
        severity: ErrorSeverity::Error,
        critical: false,
    },
    Self::InvalidRequest(_) => {
        retryable: false,
        severity: ErrorSeverity::Warning,
        critical: false,
    },
    Self::Internal(_) => {
        retryable: false,
        severity: ErrorSeverity::Critical,
        critical: true,
    },
);

/// Result type alias for PiiGuard operations
pub type Result<T> = std::result::Result<T, PiiGuardError>;
