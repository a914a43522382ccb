//! Domain constants
//!
//! Service limits, defaults and metric/service names shared by the engine
//! and its adapters.

// Segmentation defaults
pub const MIN_CHUNK_BYTES: usize = 4; // smallest buffer that fits any UTF-8 code point
pub const DEFAULT_CLASSIFICATION_CHUNK_BYTES: usize = 5000;
pub const DEFAULT_DETECTION_CHUNK_BYTES: usize = 5000;
pub const DEFAULT_OVERLAP_TOKENS: usize = 20;
pub const DEFAULT_MAX_OVERLAP_CHARS: usize = 200;

// Document limits
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 1_048_576;
pub const DEFAULT_LANGUAGE_CODE: &str = "en";

// Worker pools
pub const DEFAULT_CLASSIFICATION_WORKERS: usize = 20;
pub const DEFAULT_DETECTION_WORKERS: usize = 8;

// External service retry budget (initial attempt + retries)
pub const DEFAULT_SERVICE_MAX_ATTEMPTS: usize = 7;

// Time reserved after the pipeline deadline for responding and flushing metrics
pub const RESERVED_CLEANUP_MS: u64 = 2000;

// Redaction defaults
pub const ALL_ENTITY_TYPES: &str = "ALL";
pub const DEFAULT_MASK_CHARACTER: char = '*';
pub const MIN_CONFIDENCE_THRESHOLD: f64 = 0.5;
pub const MAX_CONFIDENCE_THRESHOLD: f64 = 1.0;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

// Service and API names used as metric dimensions
pub const SERVICE_COMPREHEND: &str = "Comprehend";
pub const API_CONTAINS_PII_ENTITIES: &str = "ContainsPiiEntities";
pub const API_DETECT_PII_ENTITIES: &str = "DetectPiiEntities";
pub const SERVICE_S3: &str = "S3";
pub const API_DOWNLOAD_PRESIGNED_URL: &str = "DownloadPresignedUrl";
pub const API_WRITE_GET_OBJECT_RESPONSE: &str = "WriteGetObjectResponse";

// Metric names
pub const METRIC_LATENCY: &str = "Latency";
pub const METRIC_ERROR_COUNT: &str = "ErrorCount";
pub const METRIC_DOCUMENTS_PROCESSED: &str = "DocumentsProcessed";
pub const METRIC_PII_DOCUMENTS_PROCESSED: &str = "PiiDocumentsProcessed";
pub const METRIC_PII_DOCUMENT_TYPES_PROCESSED: &str = "PiiDocumentTypesProcessed";
