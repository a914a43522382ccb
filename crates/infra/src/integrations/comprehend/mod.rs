//! PII service integration for classification and entity detection
//!
//! [`HttpPiiServiceClient`] speaks the service's JSON protocol and implements
//! both the `Classifier` and `Detector` ports:
//!
//! | Port | API | Response |
//! |------|-----|----------|
//! | `Classifier` | `ContainsPiiEntities` | `Labels[{Name, Score}]` |
//! | `Detector` | `DetectPiiEntities` | `Entities[{Type, BeginOffset, EndOffset, Score}]` |
//!
//! # Error Handling
//!
//! - **Throttling (429) and server errors (5xx)**: retried by `HttpClient`
//!   with exponential backoff, up to `max_attempts`
//! - **Client errors (4xx)**: not retried
//! - Every final failure is `PiiGuardError::ExternalService`
//!
//! Every request carries an `x-amzn-session-id` header so calls of one
//! invocation can be correlated on the service side.
pub mod client;
pub mod types;

pub use client::HttpPiiServiceClient;
pub use types::EntityLabel;
