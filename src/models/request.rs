//! Render request - everything a caller supplies for one job.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::enums::DisplayMode;
use super::media::{OverlayStyle, VoiceParams};

/// Locator for content the capture collaborator should screenshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureTarget {
    /// URL or provider-specific locator to navigate to.
    pub locator: String,
    /// Stable identifier for cache keying (e.g. post id).
    pub content_id: String,
    /// Maximum secondary images to capture alongside the primary.
    #[serde(default = "default_max_secondary")]
    pub max_secondary: usize,
    /// Style options baked into the captured pixels.
    #[serde(default)]
    pub style: OverlayStyle,
}

fn default_max_secondary() -> usize {
    3
}

impl CaptureTarget {
    /// Create a target with default secondary count and style.
    pub fn new(locator: impl Into<String>, content_id: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            content_id: content_id.into(),
            max_secondary: default_max_secondary(),
            style: OverlayStyle::default(),
        }
    }
}

/// One end-to-end request to produce a finished video from narration text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Immutable narration text. Case and punctuation are preserved;
    /// fully-uppercase tokens signal emphasis.
    pub narration: String,
    /// Voice to synthesize with.
    pub voice: VoiceParams,
    /// Background clip to fit to the audio duration.
    pub background: PathBuf,
    /// Optional content to capture and overlay.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture: Option<CaptureTarget>,
    /// How overlay assets share screen time.
    #[serde(default)]
    pub display_mode: DisplayMode,
    /// Words per caption chunk; falls back to the configured default when
    /// unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words_per_chunk: Option<usize>,
    /// Output file name (placed in the configured output folder).
    pub output_name: String,
}

impl RenderRequest {
    /// Create a caption-only request with the given narration and voice.
    pub fn new(
        narration: impl Into<String>,
        voice: VoiceParams,
        background: impl Into<PathBuf>,
        output_name: impl Into<String>,
    ) -> Self {
        Self {
            narration: narration.into(),
            voice,
            background: background.into(),
            capture: None,
            display_mode: DisplayMode::default(),
            words_per_chunk: None,
            output_name: output_name.into(),
        }
    }

    /// Attach a capture target.
    pub fn with_capture(mut self, target: CaptureTarget) -> Self {
        self.capture = Some(target);
        self
    }

    /// Set the overlay display mode.
    pub fn with_display_mode(mut self, mode: DisplayMode) -> Self {
        self.display_mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_attaches_capture() {
        let req = RenderRequest::new(
            "hello world",
            VoiceParams::new("mark"),
            "/bg/parkour.mp4",
            "out.mp4",
        )
        .with_capture(CaptureTarget::new("https://example.com/p/1", "p1"))
        .with_display_mode(DisplayMode::Slide);

        assert!(req.capture.is_some());
        assert_eq!(req.display_mode, DisplayMode::Slide);
        assert_eq!(req.capture.unwrap().max_secondary, 3);
    }

    #[test]
    fn request_serializes_without_optional_fields() {
        let req = RenderRequest::new("hi", VoiceParams::new("mark"), "/bg.mp4", "out.mp4");
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("capture"));
        assert!(!json.contains("words_per_chunk"));
    }
}
