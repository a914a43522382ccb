//! Reassembly of processed chunks into one document

use piiguard_domain::{Annotation, Document};
use tracing::{debug, warn};

/// Merge processed chunks back into a single document at offset 0
///
/// Chunks are ordered by `char_offset`. Text already committed by an
/// earlier chunk wins over the overlapping prefix of a later one. Scores
/// keep the maximum per entity type. Annotations are relocated to document
/// coordinates and overlap conflicts keep the higher score, first-seen on
/// ties.
pub fn de_segment(mut documents: Vec<Document>) -> Document {
    documents.sort_by_key(|document| document.char_offset);

    let mut merged = Document::default();
    let mut merged_chars: usize = 0;

    for document in documents {
        let skip = match merged_chars.checked_sub(document.char_offset) {
            Some(skip) => skip,
            None => {
                warn!(
                    offset = document.char_offset,
                    merged_chars, "gap between chunks, appending chunk as is"
                );
                0
            }
        };

        if let Some((start, _)) = document.text.char_indices().nth(skip) {
            let suffix = &document.text[start..];
            merged_chars += suffix.chars().count();
            merged.text.push_str(suffix);
        }

        merged.merge_classification(&document.pii_classification);

        for annotation in &document.pii_entities {
            insert_annotation(&mut merged.pii_entities, annotation.relocated(document.char_offset));
        }
    }

    debug!(chars = merged_chars, entities = merged.pii_entities.len(), "de-segmented document");
    merged
}

/// Insert into an ascending, non-overlapping annotation list
///
/// A candidate overlapping existing entries replaces all of them only if it
/// scores strictly higher than each; otherwise it is dropped.
pub fn insert_annotation(annotations: &mut Vec<Annotation>, candidate: Annotation) {
    let start = annotations.partition_point(|existing| existing.end_offset <= candidate.begin_offset);
    let conflicts = annotations[start..]
        .iter()
        .take_while(|existing| existing.begin_offset < candidate.end_offset)
        .count();

    if conflicts == 0 {
        annotations.insert(start, candidate);
        return;
    }

    let end = start + conflicts;
    if annotations[start..end].iter().all(|existing| candidate.score > existing.score) {
        annotations.splice(start..end, std::iter::once(candidate));
    }
}
