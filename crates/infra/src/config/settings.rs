//! Application configuration model
//!
//! Every section has defaults, so a partial file or a sparse environment
//! yields a complete configuration. Policy enums are kept as strings here and
//! parsed by [`AppConfig::validate`].

use piiguard_core::SegmentationSettings;
use piiguard_domain::constants::{
    DEFAULT_CLASSIFICATION_WORKERS, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_DETECTION_WORKERS,
    DEFAULT_LANGUAGE_CODE, DEFAULT_MAX_DOCUMENT_BYTES, DEFAULT_SERVICE_MAX_ATTEMPTS,
    MIN_CHUNK_BYTES,
};
use piiguard_domain::{
    EntityTypeFilter, MaskMode, PiiConfig, PiiGuardError, RedactionConfig, Result,
    UnsupportedFileHandling,
};
use serde::{Deserialize, Serialize};

/// Complete service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub segmentation: SegmentationSettings,
    pub limits: LimitsConfig,
    pub concurrency: ConcurrencyConfig,
    pub pipeline: PipelineConfig,
    pub metrics: MetricsConfig,
    pub service: ServiceConfig,
    pub object_store: ObjectStoreConfig,
    pub pii_defaults: PiiDefaults,
    pub logging: LoggingConfig,
    pub default_language_code: String,
    /// `PASS` or `FAIL`
    pub unsupported_file_handling: String,
    pub partial_object_supported: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            segmentation: SegmentationSettings::default(),
            limits: LimitsConfig::default(),
            concurrency: ConcurrencyConfig::default(),
            pipeline: PipelineConfig::default(),
            metrics: MetricsConfig::default(),
            service: ServiceConfig::default(),
            object_store: ObjectStoreConfig::default(),
            pii_defaults: PiiDefaults::default(),
            logging: LoggingConfig::default(),
            default_language_code: DEFAULT_LANGUAGE_CODE.to_string(),
            unsupported_file_handling: UnsupportedFileHandling::default().to_string(),
            partial_object_supported: false,
        }
    }
}

impl AppConfig {
    /// Check every value the engine would otherwise reject later
    ///
    /// # Errors
    /// Returns `PiiGuardError::Configuration` for chunk sizes below 4 bytes,
    /// zero worker counts, an unknown unsupported-file policy or invalid PII
    /// defaults.
    pub fn validate(&self) -> Result<()> {
        for (name, bytes) in [
            ("classification", self.segmentation.classification_chunk_bytes),
            ("detection", self.segmentation.detection_chunk_bytes),
        ] {
            if bytes < MIN_CHUNK_BYTES {
                return Err(PiiGuardError::configuration(format!(
                    "{name} chunk size must be at least {MIN_CHUNK_BYTES} bytes, got {bytes}"
                )));
            }
        }

        if self.concurrency.classification_workers == 0 || self.concurrency.detection_workers == 0 {
            return Err(PiiGuardError::configuration("worker counts must be greater than zero"));
        }

        if self.service.max_attempts == 0 {
            return Err(PiiGuardError::configuration("service max_attempts must be at least 1"));
        }

        self.unsupported_file_policy()?;
        self.pii_defaults.redaction_config()?;
        Ok(())
    }

    /// Parsed unsupported-file policy
    ///
    /// # Errors
    /// Returns `PiiGuardError::Configuration` for anything but `PASS`/`FAIL`.
    pub fn unsupported_file_policy(&self) -> Result<UnsupportedFileHandling> {
        self.unsupported_file_handling.parse().map_err(|_| {
            PiiGuardError::configuration(format!(
                "unknown unsupported file handling policy {:?}, expected PASS or FAIL",
                self.unsupported_file_handling
            ))
        })
    }
}

/// Size ceilings applied before processing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_document_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self { max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES }
    }
}

/// Worker pool sizes for the two service APIs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    pub classification_workers: usize,
    pub detection_workers: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            classification_workers: DEFAULT_CLASSIFICATION_WORKERS,
            detection_workers: DEFAULT_DETECTION_WORKERS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Redact without the classification pre-filter
    pub detection_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub publish: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { publish: true }
    }
}

/// PII service endpoint and retry budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub endpoint: Option<String>,
    /// Initial attempt plus retries
    pub max_attempts: usize,
    pub user_agent: String,
    pub timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            max_attempts: DEFAULT_SERVICE_MAX_ATTEMPTS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Endpoint receiving `WriteGetObjectResponse` calls
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStoreConfig {
    pub endpoint: Option<String>,
}

pub const DEFAULT_USER_AGENT: &str = "S3ObjectLambda/1.0";

/// Fallback values for per-request PII options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PiiDefaults {
    pub pii_entity_types: EntityTypeFilter,
    /// `MASK` or `REPLACE_WITH_PII_ENTITY_TYPE`
    pub mask_mode: String,
    pub mask_character: String,
    pub confidence_threshold: f64,
}

impl Default for PiiDefaults {
    fn default() -> Self {
        Self {
            pii_entity_types: EntityTypeFilter::All,
            mask_mode: MaskMode::default().to_string(),
            mask_character: "*".to_string(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

impl PiiDefaults {
    /// Redaction config built from the defaults alone
    ///
    /// # Errors
    /// Returns `PiiGuardError::Configuration` for an out-of-range threshold,
    /// an unknown mask mode or a mask character that is not one character.
    pub fn redaction_config(&self) -> Result<RedactionConfig> {
        let pii = PiiConfig::new(self.pii_entity_types.clone(), self.confidence_threshold)?;
        Ok(RedactionConfig::new(
            pii,
            parse_mask_mode(&self.mask_mode)?,
            RedactionConfig::parse_mask_character(&self.mask_character)?,
        ))
    }
}

pub(crate) fn parse_mask_mode(value: &str) -> Result<MaskMode> {
    value.parse().map_err(|_| {
        PiiGuardError::configuration(format!(
            "unknown mask mode {value:?}, expected MASK or REPLACE_WITH_PII_ENTITY_TYPE"
        ))
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}
