//! Entity redaction

pub mod redactor;

pub use redactor::Redactor;
