//! Transport ports - where documents come from and where results go

use std::collections::BTreeMap;

use async_trait::async_trait;
use piiguard_domain::Result;

/// A downloaded source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub text: String,
    /// Response headers of the download, forwarded with the result
    pub headers: BTreeMap<String, String>,
    pub status_code: u16,
}

/// Routing information identifying the caller waiting for a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseTarget {
    pub route: String,
    pub token: String,
}

/// Trait for fetching the text to process
#[async_trait]
pub trait TextSource: Send + Sync {
    /// Download the document at `locator`
    ///
    /// # Errors
    /// - `SizeLimitExceeded` if the document is larger than the configured
    ///   ceiling
    /// - `UnsupportedInput` if the content is not text
    /// - `SourceFetch` for remote errors
    async fn download(
        &self,
        locator: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<SourceDocument>;
}

/// Trait for delivering results to the caller
#[async_trait]
pub trait ResponseSink: Send + Sync {
    /// Respond with a document body
    async fn respond_with_data(
        &self,
        target: &ResponseTarget,
        body: Vec<u8>,
        headers: &BTreeMap<String, String>,
        status_code: u16,
    ) -> Result<()>;

    /// Respond with an error
    async fn respond_with_error(
        &self,
        target: &ResponseTarget,
        status_code: u16,
        error_code: &str,
        message: &str,
    ) -> Result<()>;
}
