//! Per-invocation classification and redaction configuration
//!
//! Built once from caller-supplied parameters and immutable afterwards.
//! Construction validates eagerly so an invalid threshold never reaches the
//! engine.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::constants::{
    ALL_ENTITY_TYPES, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MASK_CHARACTER,
    MAX_CONFIDENCE_THRESHOLD, MIN_CONFIDENCE_THRESHOLD,
};
use crate::errors::{PiiGuardError, Result};

/// Which entity types the caller cares about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub enum EntityTypeFilter {
    /// Every entity type (the `ALL` sentinel)
    All,
    /// Only the listed entity types
    Only(BTreeSet<String>),
}

impl EntityTypeFilter {
    /// Build from a list of names; any `ALL` entry selects every type
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selected = BTreeSet::new();
        for name in names {
            let name = name.as_ref().trim();
            if name == ALL_ENTITY_TYPES {
                return Self::All;
            }
            if !name.is_empty() {
                selected.insert(name.to_string());
            }
        }
        Self::Only(selected)
    }

    /// Parse a comma separated list such as `"SSN,NAME"` or `"ALL"`
    pub fn parse_list(list: &str) -> Self {
        Self::from_names(list.split(','))
    }

    pub fn includes(&self, entity_type: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(types) => types.contains(entity_type),
        }
    }
}

impl Default for EntityTypeFilter {
    fn default() -> Self {
        Self::All
    }
}

impl From<Vec<String>> for EntityTypeFilter {
    fn from(names: Vec<String>) -> Self {
        Self::from_names(names)
    }
}

impl From<EntityTypeFilter> for Vec<String> {
    fn from(filter: EntityTypeFilter) -> Self {
        match filter {
            EntityTypeFilter::All => vec![ALL_ENTITY_TYPES.to_string()],
            EntityTypeFilter::Only(types) => types.into_iter().collect(),
        }
    }
}

/// How kept entity spans are rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskMode {
    /// Replace every character of the span with the mask character
    #[default]
    Mask,
    /// Replace the span with `[ENTITY_TYPE]`
    ReplaceWithPiiEntityType,
}

crate::impl_domain_enum_conversions!(MaskMode {
    Mask => "MASK",
    ReplaceWithPiiEntityType => "REPLACE_WITH_PII_ENTITY_TYPE",
});

/// What to do with content that cannot be decoded as text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnsupportedFileHandling {
    /// Return the original content unchanged
    Pass,
    /// Reject the request
    #[default]
    Fail,
}

crate::impl_domain_enum_conversions!(UnsupportedFileHandling {
    Pass => "PASS",
    Fail => "FAIL",
});

/// Entity filter plus confidence threshold
///
/// Shared by classification (access control) and redaction.
#[derive(Debug, Clone, PartialEq)]
pub struct PiiConfig {
    pii_entity_types: EntityTypeFilter,
    confidence_threshold: f64,
}

/// Configuration used for access-control classification
pub type ClassificationConfig = PiiConfig;

impl PiiConfig {
    /// Validate and build
    ///
    /// # Errors
    /// Returns `PiiGuardError::Configuration` if the threshold is outside
    /// `[0.5, 1.0]` or not a number.
    pub fn new(pii_entity_types: EntityTypeFilter, confidence_threshold: f64) -> Result<Self> {
        if !(MIN_CONFIDENCE_THRESHOLD..=MAX_CONFIDENCE_THRESHOLD).contains(&confidence_threshold) {
            return Err(PiiGuardError::configuration(format!(
                "confidence threshold {confidence_threshold} is not within allowed range \
                 [{MIN_CONFIDENCE_THRESHOLD}, {MAX_CONFIDENCE_THRESHOLD}]"
            )));
        }
        Ok(Self { pii_entity_types, confidence_threshold })
    }

    pub const fn pii_entity_types(&self) -> &EntityTypeFilter {
        &self.pii_entity_types
    }

    pub const fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    /// An entity type is interesting if it passes the filter and scores at
    /// or above the threshold
    pub fn is_interested(&self, entity_type: &str, score: f64) -> bool {
        self.pii_entity_types.includes(entity_type) && score >= self.confidence_threshold
    }

    /// Interesting entity types of a classification map, in name order
    pub fn interested_types(&self, classification: &BTreeMap<String, f64>) -> Vec<String> {
        classification
            .iter()
            .filter(|(entity_type, score)| self.is_interested(entity_type, **score))
            .map(|(entity_type, _)| entity_type.clone())
            .collect()
    }
}

impl Default for PiiConfig {
    fn default() -> Self {
        Self {
            pii_entity_types: EntityTypeFilter::All,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

/// Classification settings plus the masking policy
#[derive(Debug, Clone, PartialEq)]
pub struct RedactionConfig {
    pii: PiiConfig,
    mask_mode: MaskMode,
    mask_character: char,
}

impl RedactionConfig {
    pub const fn new(pii: PiiConfig, mask_mode: MaskMode, mask_character: char) -> Self {
        Self { pii, mask_mode, mask_character }
    }

    /// Parse a mask character given as a string
    ///
    /// # Errors
    /// Returns `PiiGuardError::Configuration` unless `value` is exactly one
    /// character.
    pub fn parse_mask_character(value: &str) -> Result<char> {
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(PiiGuardError::configuration(format!(
                "mask character must be a single character, got {value:?}"
            ))),
        }
    }

    pub const fn pii(&self) -> &PiiConfig {
        &self.pii
    }

    pub const fn mask_mode(&self) -> MaskMode {
        self.mask_mode
    }

    pub const fn mask_character(&self) -> char {
        self.mask_character
    }

    pub const fn confidence_threshold(&self) -> f64 {
        self.pii.confidence_threshold
    }
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self::new(PiiConfig::default(), MaskMode::Mask, DEFAULT_MASK_CHARACTER)
    }
}
