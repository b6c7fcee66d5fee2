//! Caption segmentation with proportional timing.
//!
//! Narration is tokenized into whitespace-separated words (case and
//! punctuation preserved) and partitioned into consecutive chunks whose
//! windows are proportional to their token share of the audio duration.
//! The chunks are contiguous and non-overlapping, the first starts at 0,
//! the last ends exactly at the total duration, and the chunk texts
//! concatenated in order reproduce the token sequence exactly once.

mod segmenter;

pub use segmenter::{segment, tokenize, SegmentError, SegmentResult};
