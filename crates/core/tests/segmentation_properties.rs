//! Property tests for segmentation and redaction

use piiguard_core::{de_segment, Redactor, Segmenter};
use piiguard_domain::{Annotation, RedactionConfig};
use proptest::prelude::*;

fn words() -> impl Strategy<Value = String> {
    prop::collection::vec(prop_oneof!["[a-z]{1,12}", "\\PC{1,6}", Just(" ".to_string())], 0..80)
        .prop_map(|parts| parts.join(" "))
}

proptest! {
    #[test]
    fn test_segmentation_round_trips(
        text in words(),
        max_chunk_bytes in 4usize..64,
        overlap_tokens in 0usize..6,
        max_overlap_chars in 0usize..40,
    ) {
        let segmenter = Segmenter::with_overlap(max_chunk_bytes, overlap_tokens, max_overlap_chars).unwrap();
        let mut segments = segmenter.segment(&text, 0);
        segments.reverse();
        prop_assert_eq!(de_segment(segments).text, text);
    }

    #[test]
    fn test_segments_are_byte_bounded_and_correctly_placed(
        text in words(),
        max_chunk_bytes in 4usize..64,
        base_offset in 0usize..1000,
    ) {
        let chars: Vec<char> = text.chars().collect();
        let segments = Segmenter::with_overlap(max_chunk_bytes, 3, 20).unwrap().segment(&text, base_offset);

        for segment in segments {
            prop_assert!(segment.text.len() <= max_chunk_bytes);
            let start = segment.char_offset - base_offset;
            let expected: String = chars[start..start + segment.char_len()].iter().collect();
            prop_assert_eq!(segment.text, expected);
        }
    }

    #[test]
    fn test_redaction_preserves_length_in_mask_mode(
        text in "\\PC{0,60}",
        spans in prop::collection::vec((0usize..60, 0usize..8, 0.0f64..1.0), 0..6),
    ) {
        let mut annotations: Vec<Annotation> = spans
            .into_iter()
            .map(|(begin, len, score)| Annotation::new("NAME", begin, begin + len, score))
            .collect();
        annotations.sort_by_key(|a| a.begin_offset);

        let redacted = Redactor::new(RedactionConfig::default()).redact(&text, &annotations);
        prop_assert_eq!(redacted.chars().count(), text.chars().count());
    }
}
