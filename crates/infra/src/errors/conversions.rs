//! Conversions from external infrastructure errors into domain errors.

use std::error::Error as _;

use piiguard_domain::PiiGuardError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub PiiGuardError);

impl From<InfraError> for PiiGuardError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<PiiGuardError> for InfraError {
    fn from(value: PiiGuardError) -> Self {
        Self(value)
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → PiiGuardError */
/* -------------------------------------------------------------------------- */

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        let error = if value.is_builder() {
            PiiGuardError::configuration(format!("invalid HTTP client or request: {value}"))
        } else {
            PiiGuardError::internal(describe_http_error(&value))
        };
        Self(error)
    }
}

/// Short description of a transport failure for logs and error messages
///
/// Never includes the request URL, which may carry signed credentials.
pub fn describe_http_error(err: &HttpError) -> String {
    let kind = if err.is_timeout() {
        "request timed out"
    } else if err.is_connect() {
        "connection failed"
    } else if err.is_body() || err.is_decode() {
        "failed to read response body"
    } else if err.is_redirect() {
        "too many redirects"
    } else {
        "request failed"
    };

    match err.source() {
        Some(source) => format!("http {kind}: {source}"),
        None => format!("http {kind}"),
    }
}
