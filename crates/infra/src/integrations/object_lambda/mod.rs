//! Object Lambda transport: presigned URL downloads and
//! `WriteGetObjectResponse` delivery
//!
//! - **Source**: [`HttpTextSource`] downloads the requested object, detecting
//!   XML error documents and enforcing the size ceiling
//! - **Response**: [`HttpResponseSink`] returns redacted data or an error to
//!   the waiting caller
//! - **Error codes**: object store error codes and their HTTP statuses

pub mod error_codes;
pub mod response;
pub mod source;

pub use error_codes::{resolve_error_code, status_for_code, INTERNAL_ERROR};
pub use response::HttpResponseSink;
pub use source::HttpTextSource;
