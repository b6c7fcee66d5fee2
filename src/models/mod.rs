//! Core data model shared across the pipeline.

mod enums;
mod media;
mod request;

pub use enums::{CaptureTheme, DisplayMode, RenderState, TransitionType};
pub use media::{
    AnimationInstruction, AudioArtifact, BackgroundSpec, CaptionChunk, CropWindow, OverlayAsset,
    OverlayStyle, Resolution, VoiceParams,
};
pub use request::{CaptureTarget, RenderRequest};
