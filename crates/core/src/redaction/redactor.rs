//! Masks or replaces entity spans in text
//!
//! Offsets are character indices. Annotations are expected in ascending,
//! non-overlapping order as produced by de-segmentation; out-of-order or
//! out-of-range offsets are clamped rather than rejected.

use piiguard_domain::{Annotation, MaskMode, RedactionConfig};
use tracing::debug;

/// Applies a [`RedactionConfig`] to annotated text
#[derive(Debug, Clone)]
pub struct Redactor {
    config: RedactionConfig,
}

impl Redactor {
    pub const fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &RedactionConfig {
        &self.config
    }

    /// Redact every annotation at or above the confidence threshold whose
    /// type is selected by the entity filter
    pub fn redact(&self, text: &str, annotations: &[Annotation]) -> String {
        let mut redacted = String::with_capacity(text.len());
        let mut cursor = CharCursor::new(text);
        let mut previous_end = (0, 0);
        let mut rewritten = 0;

        for annotation in annotations {
            if annotation.score < self.config.confidence_threshold() {
                continue;
            }

            let (begin_char, begin_byte) = cursor.seek(annotation.begin_offset.max(previous_end.0));
            let (end_char, end_byte) = cursor.seek(annotation.end_offset.max(begin_char));
            redacted.push_str(&text[previous_end.1..begin_byte]);

            if self.config.pii().pii_entity_types().includes(&annotation.entity_type) {
                match self.config.mask_mode() {
                    MaskMode::ReplaceWithPiiEntityType => {
                        redacted.push('[');
                        redacted.push_str(&annotation.entity_type);
                        redacted.push(']');
                    }
                    MaskMode::Mask => {
                        redacted.extend(
                            std::iter::repeat(self.config.mask_character()).take(end_char - begin_char),
                        );
                    }
                }
                rewritten += 1;
            } else {
                redacted.push_str(&text[begin_byte..end_byte]);
            }
            previous_end = (end_char, end_byte);
        }

        redacted.push_str(&text[previous_end.1..]);
        debug!(annotations = annotations.len(), rewritten, "redacted text");
        redacted
    }
}

/// Forward-only character index to byte index mapping
struct CharCursor<'a> {
    chars: std::str::CharIndices<'a>,
    len: usize,
    char_pos: usize,
    byte_pos: usize,
}

impl<'a> CharCursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { chars: text.char_indices(), len: text.len(), char_pos: 0, byte_pos: 0 }
    }

    /// Move to `char_index` (never backwards, stopping at the end of the text)
    /// and return the reached `(char, byte)` position
    fn seek(&mut self, char_index: usize) -> (usize, usize) {
        while self.char_pos < char_index {
            match self.chars.next() {
                Some((byte, ch)) => {
                    self.byte_pos = byte + ch.len_utf8();
                    self.char_pos += 1;
                }
                None => {
                    self.byte_pos = self.len;
                    break;
                }
            }
        }
        (self.char_pos, self.byte_pos)
    }
}
