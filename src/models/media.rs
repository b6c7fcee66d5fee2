//! Media artifacts produced and consumed by the pipeline stages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::enums::{CaptureTheme, TransitionType};

/// Voice parameters passed to the speech-synthesis provider.
///
/// Every field participates in the audio fingerprint: two requests with the
/// same text but different parameters must never share a cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceParams {
    /// Provider-specific voice identifier.
    pub voice_id: String,
    /// Delivery stability, 0.0 (expressive) to 1.0 (monotone).
    #[serde(default = "default_stability")]
    pub stability: f64,
    /// Similarity boost toward the reference voice.
    #[serde(default = "default_similarity")]
    pub similarity_boost: f64,
    /// Style exaggeration weight.
    #[serde(default)]
    pub style_weight: f64,
}

fn default_stability() -> f64 {
    0.45
}

fn default_similarity() -> f64 {
    0.75
}

impl VoiceParams {
    /// Create params for a voice with default delivery settings.
    pub fn new(voice_id: impl Into<String>) -> Self {
        Self {
            voice_id: voice_id.into(),
            stability: default_stability(),
            similarity_boost: default_similarity(),
            style_weight: 0.0,
        }
    }

    /// Canonical string form folded into the audio fingerprint.
    ///
    /// Fixed-precision formatting keeps the fingerprint stable across
    /// serializer changes.
    pub fn fingerprint_material(&self) -> String {
        format!(
            "{}|{:.4}|{:.4}|{:.4}",
            self.voice_id, self.stability, self.similarity_boost, self.style_weight
        )
    }
}

/// A cached, duration-stamped synthesized audio file.
///
/// Owned by the cache store; lives across render jobs until invalidated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioArtifact {
    /// Content fingerprint (hash of normalized text + voice params).
    pub fingerprint: String,
    /// Path to the audio file inside the cache.
    pub file_path: PathBuf,
    /// Playback duration in seconds.
    pub duration_seconds: f64,
    /// Voice parameters the audio was synthesized with.
    pub voice: VoiceParams,
    /// ISO timestamp of synthesis.
    pub created_at: String,
}

/// One timed group of words displayed together on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionChunk {
    /// Chunk text, tokens joined by single spaces.
    pub text: String,
    /// Window start in seconds from job start.
    pub start: f64,
    /// Window end in seconds.
    pub end: f64,
    /// Chunk contains a fully-uppercase emphasis token.
    pub has_emphasis: bool,
}

impl CaptionChunk {
    /// Displayed duration of this chunk.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Pixel rectangle within the source clip, pre-scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Output frame dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Width / height as a float.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Plan for fitting a background clip to an exact duration and aspect ratio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundSpec {
    /// Source clip path.
    pub source_path: PathBuf,
    /// Seek offset into the source, seconds (0 when looping).
    pub start_offset: f64,
    /// Times the source plays, at least 1; raw coverage is truncated to
    /// `duration` at compose time.
    pub loop_count: u32,
    /// Centered scale-to-cover crop in source pixels.
    pub crop: CropWindow,
    /// Output resolution after cropping.
    pub target: Resolution,
    /// Exact played duration in seconds.
    pub duration: f64,
}

/// Style parameters that change captured pixels.
///
/// All fields are part of the overlay cache key: serving an asset captured
/// under different style options would silently mismatch the render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    /// Font size multiplier injected into the captured page.
    pub font_scale: f64,
    /// Highlight color for headings/emphasis, e.g. "#ffff00".
    pub highlight_color: Option<String>,
    /// Page color scheme.
    pub theme: CaptureTheme,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            font_scale: 1.0,
            highlight_color: None,
            theme: CaptureTheme::Dark,
        }
    }
}

impl OverlayStyle {
    /// Canonical string form hashed into the cache key.
    pub fn cache_material(&self) -> String {
        format!(
            "{:.3}|{}|{}",
            self.font_scale,
            self.highlight_color.as_deref().unwrap_or("-"),
            self.theme.as_str()
        )
    }
}

/// A captured image inserted into the composed video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayAsset {
    /// Identifier of the captured content (e.g. a post id).
    pub content_id: String,
    /// Slot within the capture, e.g. "post", "comment_1".
    pub slot: String,
    /// Path to the PNG inside the cache.
    pub image_path: PathBuf,
    /// Style the capture was made with.
    pub style: OverlayStyle,
    /// Asset was served from cache without an external call.
    pub from_cache: bool,
}

/// Timing and transition for one overlay asset, computed per render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationInstruction {
    /// Slot name of the asset this instruction animates.
    pub slot: String,
    /// Image to display.
    pub image_path: PathBuf,
    /// Visibility window start, seconds.
    pub start: f64,
    /// Visibility window end, seconds.
    pub end: f64,
    /// Entrance transition.
    pub transition: TransitionType,
    /// Transition length in seconds.
    pub transition_duration: f64,
}

impl AnimationInstruction {
    /// Displayed duration of this asset.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_params_fingerprint_material_is_stable() {
        let a = VoiceParams::new("mark");
        let b = VoiceParams::new("mark");
        assert_eq!(a.fingerprint_material(), b.fingerprint_material());

        let mut c = VoiceParams::new("mark");
        c.stability = 0.9;
        assert_ne!(a.fingerprint_material(), c.fingerprint_material());
    }

    #[test]
    fn overlay_style_cache_material_covers_all_fields() {
        let base = OverlayStyle::default();
        let mut scaled = OverlayStyle::default();
        scaled.font_scale = 1.5;
        let mut highlighted = OverlayStyle::default();
        highlighted.highlight_color = Some("#ffff00".to_string());
        let mut light = OverlayStyle::default();
        light.theme = CaptureTheme::Light;

        let materials = [
            base.cache_material(),
            scaled.cache_material(),
            highlighted.cache_material(),
            light.cache_material(),
        ];
        for (i, a) in materials.iter().enumerate() {
            for (j, b) in materials.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "style variants {i} and {j} collide");
                }
            }
        }
    }

    #[test]
    fn resolution_aspect_ratio() {
        let portrait = Resolution {
            width: 1080,
            height: 1920,
        };
        assert!((portrait.aspect_ratio() - 0.5625).abs() < 1e-9);
        assert_eq!(portrait.to_string(), "1080x1920");
    }

    #[test]
    fn caption_chunk_duration() {
        let chunk = CaptionChunk {
            text: "This is".to_string(),
            start: 1.8,
            end: 3.6,
            has_emphasis: false,
        };
        assert!((chunk.duration() - 1.8).abs() < 1e-9);
    }
}
