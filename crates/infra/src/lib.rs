//! # PiiGuard Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - Configuration loading (environment, `.env`, JSON/TOML files)
//! - Logging initialisation and the buffered metrics sink
//! - HTTP client with retry and backoff
//! - Object transport adapters (source download, response delivery)
//! - The PII service client (classification and entity detection)
//! - Request handlers with error-to-response mapping
//!
//! ## Architecture
//! - Implements traits defined in `piiguard-core`
//! - Contains all "impure" code (network, environment, files)

pub mod config;
pub mod errors;
pub mod handlers;
pub mod http;
pub mod integrations;
pub mod observability;

// Re-export commonly used items
pub use config::{AppConfig, InvocationOptions};
pub use errors::InfraError;
pub use handlers::{
    AccessControlHandler, ErrorResponse, HandledResponse, HandlerContext, ObjectRequest,
    RedactionHandler,
};
pub use http::HttpClient;
pub use integrations::comprehend::HttpPiiServiceClient;
pub use integrations::object_lambda::{HttpResponseSink, HttpTextSource};
pub use observability::{init_tracing, BufferedMetricsSink, MetricsPublisher};
