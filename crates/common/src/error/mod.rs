//! Error classification shared by every PiiGuard crate.
//!
//! Crates define their own closed `thiserror` enums and implement
//! [`ErrorClassification`] so boundary layers can make uniform decisions
//! (log level, retry, alerting) without matching on concrete variants.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use piiguard_common::error::{ErrorClassification, ErrorSeverity};
//! use piiguard_common::impl_error_classification;
//!
//! #[derive(Debug, thiserror::Error)]
//! pub enum FetchError {
//!     #[error("throttled")]
//!     Throttled,
//!     #[error("missing object: {0}")]
//!     Missing(String),
//! }
//!
//! impl_error_classification!(FetchError,
//!     Self::Throttled => {
//!         retryable: true,
//!         severity: ErrorSeverity::Warning,
//!         critical: false,
//!         retry_after: Some(Duration::from_secs(1)),
//!     },
//!     Self::Missing(_) => {
//!         retryable: false,
//!         severity: ErrorSeverity::Error,
//!         critical: false,
//!     },
//! );
//!
//! assert!(FetchError::Throttled.is_retryable());
//! assert_eq!(FetchError::Missing("a".into()).severity(), ErrorSeverity::Error);
//! ```

use std::fmt;
use std::time::Duration;

/// Error classification trait for consistent error handling
///
/// Boundary layers use this to pick a log level and to decide whether an
/// invocation failure is worth retrying by the caller.
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient: timeouts, throttling, temporary
    /// service unavailability.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    ///
    /// Critical errors indicate internal invariant violations.
    fn is_critical(&self) -> bool;

    /// Get the suggested retry delay if applicable
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically a control-flow signal
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Implement [`ErrorClassification`] from a table of variant patterns.
///
/// Every arm supplies `retryable`, `severity` and `critical`; `retry_after`
/// is optional and defaults to `None`. The patterns must be exhaustive.
#[macro_export]
macro_rules! impl_error_classification {
    (@retry_after $retry_after:expr) => { $retry_after };
    (@retry_after) => { None };

    (
        $error_type:ty
        $(,
            $variant:pat => {
                retryable: $retryable:expr,
                severity: $severity:expr,
                critical: $critical:expr
                $(, retry_after: $retry_after:expr)?
                $(,)?
            }
        )+
        $(,)?
    ) => {
        impl $crate::error::ErrorClassification for $error_type {
            fn is_retryable(&self) -> bool {
                match self {
                    $(
                        $variant => $retryable,
                    )+
                }
            }

            fn severity(&self) -> $crate::error::ErrorSeverity {
                match self {
                    $(
                        $variant => $severity,
                    )+
                }
            }

            fn is_critical(&self) -> bool {
                match self {
                    $(
                        $variant => $critical,
                    )+
                }
            }

            fn retry_after(&self) -> Option<std::time::Duration> {
                match self {
                    $(
                        $variant => $crate::impl_error_classification!(@retry_after $($retry_after)?),
                    )+
                }
            }
        }
    };
}
