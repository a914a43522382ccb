//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file from the working directory if present
//! 2. If any known variable is set, loads from the environment
//! 3. Otherwise probes multiple paths for a config file
//! 4. Falls back to built-in defaults when no file exists
//!
//! Every environment variable is optional; unset variables take the default
//! of their field.
//!
//! ## Environment Variables
//! - `MAX_DOC_SIZE_PII_CLASSIFICATION`, `MAX_DOC_SIZE_PII_DETECTION`: chunk
//!   sizes in bytes
//! - `SUBSEGMENT_OVERLAPPING_TOKENS`, `MAX_CHARS_OVERLAP`: chunk overlap
//! - `DOCUMENT_MAX_SIZE`: largest accepted document in bytes
//! - `DEFAULT_LANGUAGE_CODE`
//! - `CONTAINS_PII_ENTITIES_THREAD_COUNT`, `DETECT_PII_ENTITIES_THREAD_COUNT`
//! - `REDACTION_API_ONLY`, `PUBLISH_CLOUD_WATCH_METRICS`,
//!   `IS_PARTIAL_OBJECT_SUPPORTED` (booleans)
//! - `UNSUPPORTED_FILE_HANDLING`: `PASS` or `FAIL`
//! - `COMPREHEND_ENDPOINT_URL`, `COMPREHEND_MAX_RETRIES`
//! - `S3_ENDPOINT_URL`: where responses are delivered
//! - `PII_ENTITY_TYPES`, `MASK_MODE`, `MASK_CHARACTER`,
//!   `CONFIDENCE_THRESHOLD`
//! - `LOG_LEVEL`, `LOG_FORMAT` (`json` or `plain`)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./piiguard.json` or `./piiguard.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names in the parent and grandparent directories
//! 4. Relative to executable location

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use piiguard_domain::{EntityTypeFilter, PiiGuardError, Result};

use super::settings::AppConfig;

const ENV_KEYS: &[&str] = &[
    "MAX_DOC_SIZE_PII_CLASSIFICATION",
    "MAX_DOC_SIZE_PII_DETECTION",
    "SUBSEGMENT_OVERLAPPING_TOKENS",
    "MAX_CHARS_OVERLAP",
    "DOCUMENT_MAX_SIZE",
    "DEFAULT_LANGUAGE_CODE",
    "CONTAINS_PII_ENTITIES_THREAD_COUNT",
    "DETECT_PII_ENTITIES_THREAD_COUNT",
    "REDACTION_API_ONLY",
    "PUBLISH_CLOUD_WATCH_METRICS",
    "UNSUPPORTED_FILE_HANDLING",
    "IS_PARTIAL_OBJECT_SUPPORTED",
    "COMPREHEND_ENDPOINT_URL",
    "COMPREHEND_MAX_RETRIES",
    "S3_ENDPOINT_URL",
    "PII_ENTITY_TYPES",
    "MASK_MODE",
    "MASK_CHARACTER",
    "CONFIDENCE_THRESHOLD",
    "LOG_LEVEL",
    "LOG_FORMAT",
];

/// Load and validate configuration with automatic fallback strategy
///
/// # Errors
/// Returns `PiiGuardError::Configuration` if:
/// - An environment variable has an invalid value
/// - A config file exists but cannot be read or parsed
/// - The resulting configuration fails [`AppConfig::validate`]
pub fn load() -> Result<AppConfig> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    let config = if env_configured() {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        config
    } else if let Some(path) = probe_config_paths() {
        load_from_file(Some(path))?
    } else {
        tracing::info!("No configuration found, using defaults");
        AppConfig::default()
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// Unset variables keep their defaults. The result is not validated.
///
/// # Errors
/// Returns `PiiGuardError::Configuration` if a variable is set to a value
/// that cannot be parsed.
pub fn load_from_env() -> Result<AppConfig> {
    let mut config = AppConfig::default();

    let segmentation = &mut config.segmentation;
    segmentation.classification_chunk_bytes =
        env_parse("MAX_DOC_SIZE_PII_CLASSIFICATION", segmentation.classification_chunk_bytes)?;
    segmentation.detection_chunk_bytes =
        env_parse("MAX_DOC_SIZE_PII_DETECTION", segmentation.detection_chunk_bytes)?;
    segmentation.overlap_tokens =
        env_parse("SUBSEGMENT_OVERLAPPING_TOKENS", segmentation.overlap_tokens)?;
    segmentation.max_overlap_chars = env_parse("MAX_CHARS_OVERLAP", segmentation.max_overlap_chars)?;

    config.limits.max_document_bytes =
        env_parse("DOCUMENT_MAX_SIZE", config.limits.max_document_bytes)?;
    config.default_language_code =
        env_string("DEFAULT_LANGUAGE_CODE").unwrap_or(config.default_language_code);

    config.concurrency.classification_workers = env_parse(
        "CONTAINS_PII_ENTITIES_THREAD_COUNT",
        config.concurrency.classification_workers,
    )?;
    config.concurrency.detection_workers =
        env_parse("DETECT_PII_ENTITIES_THREAD_COUNT", config.concurrency.detection_workers)?;

    config.pipeline.detection_only = env_bool("REDACTION_API_ONLY", config.pipeline.detection_only);
    config.metrics.publish = env_bool("PUBLISH_CLOUD_WATCH_METRICS", config.metrics.publish);
    config.partial_object_supported =
        env_bool("IS_PARTIAL_OBJECT_SUPPORTED", config.partial_object_supported);
    config.unsupported_file_handling =
        env_string("UNSUPPORTED_FILE_HANDLING").unwrap_or(config.unsupported_file_handling);

    config.service.endpoint = env_string("COMPREHEND_ENDPOINT_URL").or(config.service.endpoint);
    config.service.max_attempts = env_parse("COMPREHEND_MAX_RETRIES", config.service.max_attempts)?;
    config.object_store.endpoint = env_string("S3_ENDPOINT_URL").or(config.object_store.endpoint);

    let pii = &mut config.pii_defaults;
    if let Some(types) = env_string("PII_ENTITY_TYPES") {
        pii.pii_entity_types = EntityTypeFilter::parse_list(&types);
    }
    if let Some(mode) = env_string("MASK_MODE") {
        pii.mask_mode = mode;
    }
    // Not trimmed: a space is a valid mask character
    if let Ok(character) = std::env::var("MASK_CHARACTER") {
        pii.mask_character = character;
    }
    pii.confidence_threshold = env_parse("CONFIDENCE_THRESHOLD", pii.confidence_threshold)?;

    config.logging.level = env_string("LOG_LEVEL").unwrap_or(config.logging.level);
    if let Some(format) = env_string("LOG_FORMAT") {
        config.logging.json = format.eq_ignore_ascii_case("json");
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `PiiGuardError::Configuration` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<AppConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(PiiGuardError::configuration(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            PiiGuardError::configuration("No config file found in any of the standard locations")
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path).map_err(|e| {
        PiiGuardError::configuration(format!("Failed to read config file: {e}"))
    })?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<AppConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| PiiGuardError::configuration(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| PiiGuardError::configuration(format!("Invalid JSON format: {e}"))),
        _ => Err(PiiGuardError::configuration(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = ["piiguard.json", "piiguard.toml", "config.json", "config.toml"];

    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| [root.clone(), root.join(".."), root.join("../..")])
        .flat_map(|dir| NAMES.map(|name| dir.join(name)))
        .find(|path| path.exists())
}

/// Whether any known variable is present
fn env_configured() -> bool {
    ENV_KEYS.iter().any(|key| std::env::var_os(key).is_some())
}

/// Trimmed, non-empty value of a variable
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

/// Parse a variable, keeping `default` when it is unset
///
/// # Errors
/// Returns `PiiGuardError::Configuration` if the value does not parse.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env_string(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| PiiGuardError::configuration(format!("Invalid value for {key}: {e}"))),
        None => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    env_string(key)
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
