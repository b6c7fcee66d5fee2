//! Core enums used throughout the pipeline.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a render job.
///
/// `Failed` is terminal: a failed job never transitions again and any
/// partial output has already been deleted by the time it is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderState {
    /// Job created, pipeline not started.
    #[default]
    Pending,
    /// Pipeline is executing.
    Rendering,
    /// Output file written and renamed into place.
    Complete,
    /// A fatal stage error occurred.
    Failed,
}

impl RenderState {
    /// True once the job can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl std::fmt::Display for RenderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderState::Pending => write!(f, "pending"),
            RenderState::Rendering => write!(f, "rendering"),
            RenderState::Complete => write!(f, "complete"),
            RenderState::Failed => write!(f, "failed"),
        }
    }
}

/// How multiple overlay assets share screen time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// One asset at a time in even, non-overlapping windows.
    #[default]
    Sequential,
    /// All assets visible for the whole duration, stacked vertically,
    /// fade-ins staggered.
    Overlay,
    /// Assets slide in from the screen edge; the previous exit completes
    /// before the next entrance begins.
    Slide,
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayMode::Sequential => write!(f, "sequential"),
            DisplayMode::Overlay => write!(f, "overlay"),
            DisplayMode::Slide => write!(f, "slide"),
        }
    }
}

/// Entrance transition applied to one overlay asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionType {
    /// Alpha fade from transparent.
    Fade,
    /// Vertical translation from below the frame.
    SlideUp,
    /// Scale up from 80% to full size.
    ZoomIn,
    /// Horizontal translation from the right edge (slide display mode).
    SlideIn,
}

impl TransitionType {
    /// The cycle applied to successive assets in sequential mode.
    pub const CYCLE: [TransitionType; 3] = [
        TransitionType::Fade,
        TransitionType::SlideUp,
        TransitionType::ZoomIn,
    ];

    /// Fixed duration of this transition in seconds.
    pub fn duration_secs(&self) -> f64 {
        match self {
            TransitionType::SlideIn => 0.5,
            _ => 0.4,
        }
    }
}

impl std::fmt::Display for TransitionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionType::Fade => write!(f, "fade"),
            TransitionType::SlideUp => write!(f, "slide_up"),
            TransitionType::ZoomIn => write!(f, "zoom_in"),
            TransitionType::SlideIn => write!(f, "slide_in"),
        }
    }
}

/// Color scheme requested from the capture collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureTheme {
    #[default]
    Dark,
    Light,
    /// Dark page chrome with backgrounds stripped to transparency.
    Transparent,
}

impl CaptureTheme {
    /// String form used in cache keys and driver arguments.
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureTheme::Dark => "dark",
            CaptureTheme::Light => "light",
            CaptureTheme::Transparent => "transparent",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_state_terminality() {
        assert!(!RenderState::Pending.is_terminal());
        assert!(!RenderState::Rendering.is_terminal());
        assert!(RenderState::Complete.is_terminal());
        assert!(RenderState::Failed.is_terminal());
    }

    #[test]
    fn transition_cycle_order() {
        assert_eq!(TransitionType::CYCLE[0], TransitionType::Fade);
        assert_eq!(TransitionType::CYCLE[1], TransitionType::SlideUp);
        assert_eq!(TransitionType::CYCLE[2], TransitionType::ZoomIn);
    }

    #[test]
    fn transition_durations_in_range() {
        for t in [
            TransitionType::Fade,
            TransitionType::SlideUp,
            TransitionType::ZoomIn,
            TransitionType::SlideIn,
        ] {
            let d = t.duration_secs();
            assert!((0.4..=0.5).contains(&d), "{t} duration {d} out of range");
        }
    }

    #[test]
    fn display_mode_serializes_lowercase() {
        let json = serde_json::to_string(&DisplayMode::Sequential).unwrap();
        assert_eq!(json, "\"sequential\"");
    }
}
