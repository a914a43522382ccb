//! Document segmentation and reassembly

pub mod desegment;
pub mod segmenter;

pub use desegment::{de_segment, insert_annotation};
pub use segmenter::Segmenter;
