//! Final composition: background, audio, overlays and captions muxed
//! into one output file by ffmpeg.
//!
//! Layer order is fixed: background (bottom), overlays (middle),
//! captions (top). Captions anchor a fixed pixel margin from the bottom
//! edge; percentage-of-height anchoring drifts across resolutions and is
//! deliberately not used. Output is written to a temp file next to the
//! final path and renamed into place, so a failed encode never leaves a
//! partial file in the output directory.

mod composer;
mod filtergraph;

pub use composer::{ComposeError, ComposeInputs, ComposeOutput, ComposeResult, VideoComposer};
pub use filtergraph::{build_args, layout_overlays, CaptionStyle, OverlayPlacement};
