//! Document chunks and entity annotations
//!
//! All offsets are character (Unicode scalar value) indices, not byte
//! indices. A [`Document`]'s `char_offset` always points into the original,
//! unsegmented text.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One detected PII entity span
///
/// Offsets are half-open `[begin_offset, end_offset)`. They are chunk-local
/// as returned by a detector and document-local after relocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Annotation {
    #[serde(rename = "Type")]
    pub entity_type: String,
    pub begin_offset: usize,
    pub end_offset: usize,
    pub score: f64,
}

/// Where an annotation lies relative to another one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativePosition {
    /// Ends at or before the other begins
    LeftOf,
    /// Shares at least one position with the other
    Overlapping,
    /// Begins at or after the other ends
    RightOf,
}

impl Annotation {
    pub fn new(
        entity_type: impl Into<String>,
        begin_offset: usize,
        end_offset: usize,
        score: f64,
    ) -> Self {
        Self { entity_type: entity_type.into(), begin_offset, end_offset, score }
    }

    /// Number of characters covered
    pub const fn len(&self) -> usize {
        self.end_offset.saturating_sub(self.begin_offset)
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy shifted by `offset` characters
    #[must_use]
    pub fn relocated(&self, offset: usize) -> Self {
        Self {
            entity_type: self.entity_type.clone(),
            begin_offset: self.begin_offset + offset,
            end_offset: self.end_offset + offset,
            score: self.score,
        }
    }

    /// Compare `[begin, end)` ranges
    pub const fn position_relative_to(&self, other: &Self) -> RelativePosition {
        if self.end_offset <= other.begin_offset {
            RelativePosition::LeftOf
        } else if self.begin_offset >= other.end_offset {
            RelativePosition::RightOf
        } else {
            RelativePosition::Overlapping
        }
    }

    pub const fn overlaps(&self, other: &Self) -> bool {
        matches!(self.position_relative_to(other), RelativePosition::Overlapping)
    }
}

/// A chunk of text plus the classification and detection results for it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Chunk content
    pub text: String,
    /// Character index of `text`'s first character in the original text
    pub char_offset: usize,
    /// Highest observed score per entity type
    pub pii_classification: BTreeMap<String, f64>,
    /// Entity spans, chunk-local until relocated by de-segmentation
    pub pii_entities: Vec<Annotation>,
}

impl Document {
    /// A document spanning the start of the original text
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_offset(text, 0)
    }

    /// A chunk starting at `char_offset` in the original text
    pub fn with_offset(text: impl Into<String>, char_offset: usize) -> Self {
        Self {
            text: text.into(),
            char_offset,
            pii_classification: BTreeMap::new(),
            pii_entities: Vec::new(),
        }
    }

    /// Length of `text` in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Record `score` for `entity_type`, keeping the maximum seen so far
    pub fn merge_score(&mut self, entity_type: &str, score: f64) {
        match self.pii_classification.get_mut(entity_type) {
            Some(existing) => {
                if score.total_cmp(existing) == Ordering::Greater {
                    *existing = score;
                }
            }
            None => {
                self.pii_classification.insert(entity_type.to_string(), score);
            }
        }
    }

    /// Fold every score of `classification` into this document
    pub fn merge_classification(&mut self, classification: &BTreeMap<String, f64>) {
        for (entity_type, score) in classification {
            self.merge_score(entity_type, *score);
        }
    }
}
