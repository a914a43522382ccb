//! HTTP client with retry and backoff

pub mod client;

pub use client::{is_retryable_status, HttpClient, HttpClientBuilder, RetriedResponse};
