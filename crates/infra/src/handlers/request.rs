//! Incoming object requests

use std::collections::BTreeMap;

use piiguard_core::ResponseTarget;
use piiguard_domain::{PiiGuardError, Result};
use serde::Deserialize;

/// User request headers that ask for part of an object
pub const PARTIAL_OBJECT_HEADERS: [&str; 2] = ["Range", "PartNumber"];

/// One object request, flattened from the invocation event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectRequest {
    pub request_id: String,
    /// Presigned URL of the source object
    pub input_url: String,
    pub output_route: String,
    pub output_token: String,
    /// Access point payload with per-request options, may be blank
    pub payload: String,
    pub access_point: String,
    /// Headers of the caller's original request
    pub user_headers: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectLambdaEvent {
    x_amz_request_id: String,
    get_object_context: GetObjectContext,
    configuration: AccessPointConfiguration,
    #[serde(default)]
    user_request: UserRequest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetObjectContext {
    input_s3_url: String,
    output_route: String,
    output_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessPointConfiguration {
    #[serde(default)]
    access_point_arn: String,
    payload: String,
}

#[derive(Debug, Default, Deserialize)]
struct UserRequest {
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

impl ObjectRequest {
    /// Parse an Object Lambda invocation event
    ///
    /// # Errors
    /// Returns `PiiGuardError::InvalidRequest` if a required field is missing
    /// or has the wrong type.
    pub fn from_event(event: &serde_json::Value) -> Result<Self> {
        let event = ObjectLambdaEvent::deserialize(event)
            .map_err(|e| PiiGuardError::InvalidRequest(format!("malformed event: {e}")))?;

        Ok(Self {
            request_id: event.x_amz_request_id,
            input_url: event.get_object_context.input_s3_url,
            output_route: event.get_object_context.output_route,
            output_token: event.get_object_context.output_token,
            payload: event.configuration.payload,
            access_point: event.configuration.access_point_arn,
            user_headers: event.user_request.headers,
        })
    }

    pub fn target(&self) -> ResponseTarget {
        ResponseTarget { route: self.output_route.clone(), token: self.output_token.clone() }
    }

    /// Whether a response can be routed back to the caller at all
    pub fn is_routable(&self) -> bool {
        !self.output_route.trim().is_empty() && !self.output_token.trim().is_empty()
    }

    /// Check required fields and reject partial object requests
    ///
    /// # Errors
    /// Returns `PiiGuardError::InvalidRequest` naming the first problem.
    pub fn validate(&self, partial_object_supported: bool) -> Result<()> {
        for (name, value) in [
            ("xAmzRequestId", &self.request_id),
            ("inputS3Url", &self.input_url),
            ("outputRoute", &self.output_route),
            ("outputToken", &self.output_token),
        ] {
            if value.trim().is_empty() {
                return Err(PiiGuardError::InvalidRequest(format!("{name} is required")));
            }
        }

        if !partial_object_supported {
            if let Some(header) = self.partial_object_headers().into_keys().next() {
                return Err(PiiGuardError::InvalidRequest(format!(
                    "HTTP Header {header} is not supported"
                )));
            }
        }
        Ok(())
    }

    /// The caller's Range and PartNumber headers, forwarded to the source
    /// when partial objects are supported
    pub fn partial_object_headers(&self) -> BTreeMap<String, String> {
        self.user_headers
            .iter()
            .filter(|(name, _)| PARTIAL_OBJECT_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name)))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}
