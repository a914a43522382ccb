//! Mapping of pipeline failures to caller-facing responses

use std::collections::BTreeMap;

use piiguard_domain::{PiiGuardError, UnsupportedFileHandling};
use tracing::{error, info, warn};

use crate::integrations::object_lambda::{resolve_error_code, INTERNAL_ERROR};

pub const MSG_UNSUPPORTED_FILE: &str = "Unsupported file encountered for determining Pii";
pub const MSG_ENTITY_TOO_LARGE: &str =
    "Size of the requested object exceeds maximum file size supported";
pub const MSG_INCORRECT_SETUP: &str = "Lambda function has been incorrectly setup";
pub const MSG_CONTAINS_PII: &str = "Document Contains PII";
pub const MSG_TIMED_OUT: &str = "Failed to complete document processing within time limit";
pub const MSG_INTERNAL: &str = "An internal error occurred while processing the file";

/// What to send back for a failed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorResponse {
    /// Return the original object unchanged
    PassThrough { content: Vec<u8>, headers: BTreeMap<String, String> },
    /// Return an error status to the caller
    Reject { status_code: u16, error_code: String, message: String },
}

impl ErrorResponse {
    fn reject(status_code: u16, error_code: &str, message: impl Into<String>) -> Self {
        Self::Reject { status_code, error_code: error_code.to_string(), message: message.into() }
    }

    /// Decide the response for `error`
    pub fn from_error(error: PiiGuardError, unsupported_policy: UnsupportedFileHandling) -> Self {
        match error {
            PiiGuardError::UnsupportedInput { reason, content, headers } => match unsupported_policy {
                UnsupportedFileHandling::Pass => {
                    info!(%reason, "unsupported file, passing original content through");
                    Self::PassThrough { content, headers }
                }
                UnsupportedFileHandling::Fail => {
                    info!(%reason, "unsupported file, rejecting");
                    Self::reject(412, "PreconditionFailed", MSG_UNSUPPORTED_FILE)
                }
            },
            PiiGuardError::SizeLimitExceeded { size, limit } => {
                info!(size, limit, "requested object exceeds maximum file size supported");
                Self::reject(412, "EntityTooLarge", MSG_ENTITY_TOO_LARGE)
            }
            PiiGuardError::Configuration(message) => {
                error!(%message, "encountered an invalid configuration");
                Self::reject(400, "InvalidRequest", MSG_INCORRECT_SETUP)
            }
            PiiGuardError::InvalidRequest(message) => {
                warn!(%message, "invalid request");
                Self::reject(400, "InvalidRequest", message)
            }
            PiiGuardError::SourceFetch { code, message } => {
                error!(%code, %message, "error downloading source object");
                let (status_code, error_code) = resolve_error_code(&code);
                Self::reject(status_code, error_code, message)
            }
            PiiGuardError::AccessRestricted { entity_types } => {
                info!(entity_types = ?entity_types, "document contains restricted PII");
                Self::reject(403, "AccessDenied", MSG_CONTAINS_PII)
            }
            PiiGuardError::DeadlineExceeded { budget_ms } => {
                warn!(budget_ms, "processing did not finish within the deadline");
                Self::reject(400, "RequestTimeout", MSG_TIMED_OUT)
            }
            error @ (PiiGuardError::ExternalService { .. }
            | PiiGuardError::ReconstructionInvariant { .. }
            | PiiGuardError::Internal(_)) => {
                error!(error = %error, kind = error.kind(), "internal error occurred while processing the file");
                Self::reject(500, INTERNAL_ERROR, MSG_INTERNAL)
            }
        }
    }

    /// Status the caller will see
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::PassThrough { .. } => 200,
            Self::Reject { status_code, .. } => *status_code,
        }
    }
}
