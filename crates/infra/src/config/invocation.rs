//! Per-request options carried in the request payload
//!
//! The payload is a JSON object attached to the access point. Missing fields
//! fall back to [`PiiDefaults`]; unknown fields are ignored.

use piiguard_domain::{
    ClassificationConfig, EntityTypeFilter, PiiConfig, PiiGuardError, RedactionConfig, Result,
};
use serde::Deserialize;

use super::settings::{parse_mask_mode, PiiDefaults};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InvocationOptions {
    #[serde(default)]
    pub pii_entity_types: Option<EntityTypeFilter>,
    #[serde(default)]
    pub mask_mode: Option<String>,
    #[serde(default)]
    pub mask_character: Option<String>,
    #[serde(default)]
    pub confidence_threshold: Option<f64>,
    #[serde(default)]
    pub language_code: Option<String>,
}

/// Options merged with defaults and validated
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub redaction: RedactionConfig,
    pub language_code: String,
}

impl ResolvedOptions {
    pub const fn classification(&self) -> &ClassificationConfig {
        self.redaction.pii()
    }
}

impl InvocationOptions {
    /// Parse a payload; a blank payload means "all defaults"
    ///
    /// # Errors
    /// Returns `PiiGuardError::Configuration` if the payload is not a JSON
    /// object of the expected shape.
    pub fn parse(payload: &str) -> Result<Self> {
        if payload.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(payload).map_err(|e| {
            PiiGuardError::configuration(format!("Invalid function payload: {e}"))
        })
    }

    /// Merge with `defaults` and validate the result
    ///
    /// # Errors
    /// Returns `PiiGuardError::Configuration` for an out-of-range threshold,
    /// an unknown mask mode or an invalid mask character.
    pub fn resolve(&self, defaults: &PiiDefaults, default_language_code: &str) -> Result<ResolvedOptions> {
        let entity_types =
            self.pii_entity_types.clone().unwrap_or_else(|| defaults.pii_entity_types.clone());
        let threshold = self.confidence_threshold.unwrap_or(defaults.confidence_threshold);
        let mask_mode = parse_mask_mode(self.mask_mode.as_deref().unwrap_or(defaults.mask_mode.as_str()))?;
        let mask_character = RedactionConfig::parse_mask_character(
            self.mask_character.as_deref().unwrap_or(defaults.mask_character.as_str()),
        )?;

        Ok(ResolvedOptions {
            redaction: RedactionConfig::new(
                PiiConfig::new(entity_types, threshold)?,
                mask_mode,
                mask_character,
            ),
            language_code: self
                .language_code
                .clone()
                .unwrap_or_else(|| default_language_code.to_string()),
        })
    }
}
