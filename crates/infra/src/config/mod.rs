//! Configuration loading and management
//!
//! This module provides utilities for loading application configuration
//! from environment variables and files, and for resolving per-request
//! options against the configured defaults.

pub mod invocation;
pub mod loader;
pub mod settings;

// Re-export commonly used items
pub use invocation::{InvocationOptions, ResolvedOptions};
pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
pub use settings::{
    AppConfig, ConcurrencyConfig, LimitsConfig, LoggingConfig, MetricsConfig, ObjectStoreConfig,
    PiiDefaults, PipelineConfig, ServiceConfig,
};
