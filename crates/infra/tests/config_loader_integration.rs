//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files.

use std::io::Write;
use std::path::PathBuf;

use piiguard_domain::{EntityTypeFilter, PiiGuardError};
use piiguard_infra::config;
use tempfile::NamedTempFile;

/// Write `contents` to a temp file and copy it to a sibling path with
/// `extension`, which the loader uses to pick the format
fn write_config(contents: &str, extension: &str) -> PathBuf {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(contents.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension(extension);
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");
    path
}

/// Loads a JSON file and checks that nested sections are applied.
///
/// # Test Steps
/// 1. Write a JSON config overriding segmentation, concurrency and defaults
/// 2. Load it with `load_from_file`
/// 3. Verify overridden values and untouched defaults
#[test]
fn test_load_config_from_json_file() {
    let path = write_config(
        r##"{
            "segmentation": { "classification_chunk_bytes": 4000, "detection_chunk_bytes": 2000 },
            "concurrency": { "classification_workers": 4, "detection_workers": 2 },
            "pipeline": { "detection_only": true },
            "pii_defaults": { "pii_entity_types": ["SSN", "NAME"], "mask_character": "#" },
            "unsupported_file_handling": "PASS",
            "service": { "endpoint": "http://localhost:4566" }
        }"##,
        "json",
    );

    let config = config::load_from_file(Some(path.clone())).expect("Failed to load JSON config");

    assert_eq!(config.segmentation.classification_chunk_bytes, 4000);
    assert_eq!(config.segmentation.detection_chunk_bytes, 2000);
    assert_eq!(config.segmentation.overlap_tokens, 20);
    assert_eq!(config.concurrency.classification_workers, 4);
    assert!(config.pipeline.detection_only);
    assert_eq!(config.pii_defaults.mask_character, "#");
    assert!(config.pii_defaults.pii_entity_types.includes("SSN"));
    assert!(!config.pii_defaults.pii_entity_types.includes("EMAIL"));
    assert_eq!(config.unsupported_file_handling, "PASS");
    assert_eq!(config.service.endpoint.as_deref(), Some("http://localhost:4566"));
    assert_eq!(config.service.max_attempts, 7);

    std::fs::remove_file(path).ok();
}

/// Loads a TOML file with the same layout as the JSON one.
///
/// # Test Steps
/// 1. Write a TOML config with limits, metrics and logging sections
/// 2. Load it with `load_from_file`
/// 3. Verify values and that the rest keeps defaults
#[test]
fn test_load_config_from_toml_file() -> anyhow::Result<()> {
    let path = write_config(
        r#"
default_language_code = "es"
partial_object_supported = true

[limits]
max_document_bytes = 2048

[metrics]
publish = false

[logging]
level = "debug"
json = true

[pii_defaults]
pii_entity_types = ["ALL"]
confidence_threshold = 0.75
"#,
        "toml",
    );

    let config = config::load_from_file(Some(path.clone()))?;

    assert_eq!(config.default_language_code, "es");
    assert!(config.partial_object_supported);
    assert_eq!(config.limits.max_document_bytes, 2048);
    assert!(!config.metrics.publish);
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json);
    assert_eq!(config.pii_defaults.pii_entity_types, EntityTypeFilter::All);
    assert_eq!(config.pii_defaults.confidence_threshold, 0.75);
    assert_eq!(config.concurrency.detection_workers, 8);
    config.validate()?;

    std::fs::remove_file(path).ok();
    Ok(())
}

#[test]
fn test_load_config_with_empty_object() {
    let path = write_config("{}", "json");

    let config = config::load_from_file(Some(path.clone())).expect("Failed to load empty config");
    assert_eq!(config, piiguard_infra::AppConfig::default());

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_config_from_nonexistent_file() {
    let result = config::load_from_file(Some("/nonexistent/path/config.json".into()));

    match result {
        Err(PiiGuardError::Configuration(msg)) => {
            assert!(msg.contains("not found"), "Error message should mention 'not found'");
        }
        other => panic!("Expected Configuration error, got {other:?}"),
    }
}

#[test]
fn test_load_config_with_invalid_format() {
    let path = write_config(r#"{ "this is": "not valid" "#, "json");

    match config::load_from_file(Some(path.clone())) {
        Err(PiiGuardError::Configuration(msg)) => {
            assert!(msg.contains("Invalid JSON"), "Error message should mention invalid JSON");
        }
        other => panic!("Expected Configuration error, got {other:?}"),
    }

    std::fs::remove_file(path).ok();
}

#[test]
fn test_invalid_values_load_but_fail_validation() {
    let path = write_config(r#"{ "concurrency": { "detection_workers": 0 } }"#, "json");

    let config = config::load_from_file(Some(path.clone())).expect("Failed to load config");
    assert!(matches!(config.validate(), Err(PiiGuardError::Configuration(_))));

    std::fs::remove_file(path).ok();
}
