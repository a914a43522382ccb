//! Object store error codes and the HTTP status each one maps to

/// Code used when a remote code is unknown or a failure has no code
pub const INTERNAL_ERROR: &str = "InternalError";

/// HTTP status of a known object store error code
pub fn status_for_code(code: &str) -> Option<u16> {
    let status = match code {
        "AccessDenied"
        | "AccountProblem"
        | "AllAccessDisabled"
        | "CrossLocationLoggingProhibited"
        | "InvalidAccessKeyId"
        | "InvalidObjectState"
        | "InvalidPayer"
        | "InvalidSecurity"
        | "NotSignedUp"
        | "RequestTimeTooSkewed"
        | "SignatureDoesNotMatch" => 403,

        "NoSuchBucket"
        | "NoSuchBucketPolicy"
        | "NoSuchKey"
        | "NoSuchLifecycleConfiguration"
        | "NoSuchUpload"
        | "NoSuchVersion"
        | "NoSuchAccessPoint" => 404,

        "MethodNotAllowed" => 405,

        "BucketAlreadyExists"
        | "BucketAlreadyOwnedByYou"
        | "BucketNotEmpty"
        | "InvalidBucketState"
        | "OperationAborted"
        | "RestoreAlreadyInProgress" => 409,

        "MissingContentLength" => 411,
        "PreconditionFailed" => 412,
        "InvalidRange" => 416,
        "InternalError" => 500,
        "ServiceUnavailable" | "SlowDown" => 503,

        "AmbiguousGrantByEmailAddress"
        | "AuthorizationHeaderMalformed"
        | "BadDigest"
        | "CredentialsNotSupported"
        | "EntityTooSmall"
        | "EntityTooLarge"
        | "ExpiredToken"
        | "IllegalLocationConstraintException"
        | "IllegalVersioningConfigurationException"
        | "IncompleteBody"
        | "IncorrectNumberOfFilesInPostRequest"
        | "InlineDataTooLarge"
        | "InvalidAccessPoint"
        | "InvalidArgument"
        | "InvalidBucketName"
        | "InvalidDigest"
        | "InvalidEncryptionAlgorithmError"
        | "InvalidLocationConstraint"
        | "InvalidPart"
        | "InvalidPartOrder"
        | "InvalidPolicyDocument"
        | "InvalidRequest"
        | "InvalidSOAPRequest"
        | "InvalidStorageClass"
        | "InvalidTargetBucketForLogging"
        | "InvalidToken"
        | "InvalidURI"
        | "KeyTooLongError"
        | "MalformedACLError"
        | "MalformedPOSTRequest"
        | "MalformedXML"
        | "MaxMessageLengthExceeded"
        | "MaxPostPreDataLengthExceededError"
        | "MetadataTooLarge"
        | "MissingRequestBodyError"
        | "MissingSecurityElement"
        | "MissingSecurityHeader"
        | "NoLoggingStatusForKey"
        | "RequestIsNotMultiPartContent"
        | "RequestTimeout"
        | "RequestTorrentOfBucketError"
        | "ServerSideEncryptionConfigurationNotFoundError"
        | "TokenRefreshRequired"
        | "TooManyAccessPoints"
        | "TooManyBuckets"
        | "UnexpectedContent"
        | "UnresolvableGrantByEmailAddress"
        | "UserKeyMustBeSpecified"
        | "InvalidTag"
        | "MalformedPolicy" => 400,

        _ => return None,
    };
    Some(status)
}

/// Status and code to report for a remote error code
///
/// Unknown codes become `500 InternalError`.
pub fn resolve_error_code(code: &str) -> (u16, &str) {
    match status_for_code(code) {
        Some(status) => (status, code),
        None => (500, INTERNAL_ERROR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_keep_their_name() {
        assert_eq!(resolve_error_code("NoSuchKey"), (404, "NoSuchKey"));
        assert_eq!(resolve_error_code("AccessDenied"), (403, "AccessDenied"));
        assert_eq!(resolve_error_code("SlowDown"), (503, "SlowDown"));
        assert_eq!(resolve_error_code("InvalidRange"), (416, "InvalidRange"));
        assert_eq!(resolve_error_code("RequestTimeout"), (400, "RequestTimeout"));
        assert_eq!(resolve_error_code("BucketNotEmpty"), (409, "BucketNotEmpty"));
    }

    #[test]
    fn test_unknown_codes_become_internal_error() {
        assert_eq!(resolve_error_code("NotARealCode"), (500, INTERNAL_ERROR));
        assert_eq!(resolve_error_code(""), (500, INTERNAL_ERROR));
        // case sensitive
        assert_eq!(status_for_code("nosuchkey"), None);
    }
}
