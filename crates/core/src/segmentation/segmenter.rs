//! Byte-bounded, word-aligned, overlapping segmentation

use piiguard_domain::constants::{DEFAULT_MAX_OVERLAP_CHARS, DEFAULT_OVERLAP_TOKENS, MIN_CHUNK_BYTES};
use piiguard_domain::{Document, PiiGuardError, Result};
use tracing::{debug, instrument};

/// Splits text into chunks no larger than `max_chunk_bytes` UTF-8 bytes
///
/// Chunks end on a space where one is found within `max_overlap_chars`
/// characters of the byte limit. Each chunk after the first repeats the last
/// `overlap_tokens` words of its predecessor so entities cut at a boundary
/// are still seen whole by one of the two chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmenter {
    max_chunk_bytes: usize,
    overlap_tokens: usize,
    max_overlap_chars: usize,
}

impl Segmenter {
    /// Segmenter with the default overlap settings
    ///
    /// # Errors
    /// Returns `PiiGuardError::Configuration` if `max_chunk_bytes` is below 4.
    pub fn new(max_chunk_bytes: usize) -> Result<Self> {
        Self::with_overlap(max_chunk_bytes, DEFAULT_OVERLAP_TOKENS, DEFAULT_MAX_OVERLAP_CHARS)
    }

    /// Segmenter with explicit overlap settings
    ///
    /// # Errors
    /// Returns `PiiGuardError::Configuration` if `max_chunk_bytes` is below 4.
    pub fn with_overlap(
        max_chunk_bytes: usize,
        overlap_tokens: usize,
        max_overlap_chars: usize,
    ) -> Result<Self> {
        if max_chunk_bytes < MIN_CHUNK_BYTES {
            return Err(PiiGuardError::configuration(format!(
                "max chunk size {max_chunk_bytes} is below the minimum of {MIN_CHUNK_BYTES} bytes"
            )));
        }
        Ok(Self { max_chunk_bytes, overlap_tokens, max_overlap_chars })
    }

    pub const fn max_chunk_bytes(&self) -> usize {
        self.max_chunk_bytes
    }

    /// Split `text` into chunks whose offsets start at `base_offset`
    ///
    /// Empty input yields no chunks. Text that already fits yields one chunk.
    #[instrument(skip(self, text), fields(bytes = text.len(), max = self.max_chunk_bytes))]
    pub fn segment(&self, text: &str, base_offset: usize) -> Vec<Document> {
        let mut segments = Vec::new();
        let mut byte_cursor = 0;
        let mut char_cursor = 0;

        while text.len() - byte_cursor > self.max_chunk_bytes {
            let rest = &text[byte_cursor..];
            let prefix: Vec<char> = byte_safe_prefix(rest, self.max_chunk_bytes).chars().collect();
            let chunk = &prefix[..self.word_aligned_len(&prefix)];
            let chunk_bytes = utf8_len(chunk);

            segments.push(Document::with_offset(&rest[..chunk_bytes], base_offset + char_cursor));

            // always at least one character forward
            let advance = self.overlap_start(chunk) + 1;
            byte_cursor += utf8_len(&chunk[..advance]);
            char_cursor += advance;
        }

        if byte_cursor < text.len() {
            segments.push(Document::with_offset(&text[byte_cursor..], base_offset + char_cursor));
        }

        debug!(segments = segments.len(), "segmented text");
        segments
    }

    /// Number of leading characters to keep so the chunk ends on a space
    fn word_aligned_len(&self, chars: &[char]) -> usize {
        let len = chars.len();
        let mut k = len - 1;
        while chars[k] != ' ' && k > 0 && len - k < self.max_overlap_chars {
            k -= 1;
        }
        k + 1
    }

    /// Index of the space preceding the `overlap_tokens`-th word from the end
    ///
    /// The next chunk begins right after it.
    fn overlap_start(&self, chunk: &[char]) -> usize {
        let len = chunk.len();
        if len < 2 {
            return 0;
        }

        let mut k = len - 1;
        let mut words = 0;
        while words < self.overlap_tokens {
            k -= 1;
            while !(chunk[k + 1] != ' ' && chunk[k] == ' ') && k > 0 && len - k < self.max_overlap_chars
            {
                k -= 1;
            }
            words += 1;
            if k == 0 {
                break;
            }
        }
        if len - k >= self.max_overlap_chars {
            debug!(scanned = len - k, "no word boundary within overlap scan window");
        }
        k
    }
}

/// Longest prefix of at most `max_bytes` bytes that does not split a code point
fn byte_safe_prefix(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut cut = max_bytes;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    &text[..cut]
}

fn utf8_len(chars: &[char]) -> usize {
    chars.iter().map(|c| c.len_utf8()).sum()
}
