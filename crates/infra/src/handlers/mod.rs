//! Request handlers for Object Lambda invocations
//!
//! Both handlers share one shape:
//!
//! ```text
//! validate ─▶ resolve options ─▶ download ─▶ pipeline (under deadline) ─▶ respond
//!     └──────────────── any failure ─▶ ErrorResponse ─▶ respond ◀───────────┘
//! ```
//!
//! Business metrics are recorded and the metric buffer is flushed after
//! every request, whatever its outcome.

pub mod access_control;
pub mod context;
pub mod redaction;
pub mod request;
pub mod response;

use std::collections::BTreeSet;

use piiguard_domain::{PiiGuardError, Result};
use tracing::info;

pub use access_control::AccessControlHandler;
pub use context::{budget_until, forwarded_headers, pipeline_budget, response_headers, HandlerContext};
pub use redaction::RedactionHandler;
pub use request::ObjectRequest;
pub use response::ErrorResponse;

use crate::observability::DocumentMetrics;

/// How a request was answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandledResponse {
    pub status_code: u16,
    /// Set for error responses
    pub error_code: Option<String>,
}

impl HandledResponse {
    pub const fn ok() -> Self {
        Self::success(200)
    }

    /// A 2xx answer carrying the source's status, e.g. 206 for a range
    pub const fn success(status_code: u16) -> Self {
        Self { status_code, error_code: None }
    }
}

/// What the pipeline got through before returning
#[derive(Debug, Clone)]
struct Progress {
    processed: bool,
    pii_types: BTreeSet<String>,
    language: String,
}

impl Progress {
    fn new(default_language: &str) -> Self {
        Self { processed: false, pii_types: BTreeSet::new(), language: default_language.to_string() }
    }
}

fn ensure_routable(request: &ObjectRequest) -> Result<()> {
    if request.is_routable() {
        Ok(())
    } else {
        Err(PiiGuardError::InvalidRequest(
            "outputRoute and outputToken are required to respond".to_string(),
        ))
    }
}

/// Answer a failed request according to [`ErrorResponse::from_error`]
async fn respond_to_failure(
    context: &HandlerContext,
    request: &ObjectRequest,
    error: PiiGuardError,
) -> Result<HandledResponse> {
    let target = request.target();
    match ErrorResponse::from_error(error, context.unsupported_policy()) {
        ErrorResponse::PassThrough { content, headers } => {
            let headers = response_headers(&headers, content.len());
            context.responder().respond_with_data(&target, content, &headers, 200).await?;
            Ok(HandledResponse::ok())
        }
        ErrorResponse::Reject { status_code, error_code, message } => {
            context.responder().respond_with_error(&target, status_code, &error_code, &message).await?;
            Ok(HandledResponse { status_code, error_code: Some(error_code) })
        }
    }
}

/// Respond to the outcome, then record business metrics and flush
async fn finish(
    context: &HandlerContext,
    request: &ObjectRequest,
    outcome: Result<u16>,
    progress: &Progress,
) -> Result<HandledResponse> {
    let response = match outcome {
        Ok(status_code) => Ok(HandledResponse::success(status_code)),
        Err(error) => respond_to_failure(context, request, error).await,
    };

    if context.config().metrics.publish {
        DocumentMetrics::new(progress.language.as_str(), request.access_point.as_str()).record(
            context.metrics(),
            progress.processed,
            &progress.pii_types,
        );
    }
    context.flush_metrics();

    if let Ok(handled) = &response {
        info!(
            request_id = %request.request_id,
            status_code = handled.status_code,
            "responded to caller"
        );
    }
    response
}
