//! Per-overlay timing and transition planning.

use thiserror::Error;

use crate::models::{AnimationInstruction, DisplayMode, OverlayAsset, TransitionType};

/// Errors from animation planning.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Available duration must be a positive finite number, got {0}")]
    InvalidDuration(f64),
}

/// Result type for planning.
pub type PlanResult<T> = Result<T, PlanError>;

/// Default fade-in stagger between stacked overlay assets, seconds.
const DEFAULT_STAGGER_SECS: f64 = 0.5;

/// Plans overlay timing and transitions for a display mode.
#[derive(Debug, Default)]
pub struct AnimationCompositor;

impl AnimationCompositor {
    pub fn new() -> Self {
        Self
    }

    /// Plan instructions for `assets` over `total_duration` seconds.
    ///
    /// No asset is ever dropped: when the per-asset share gets small the
    /// windows (and their transitions) compress proportionally.
    pub fn plan(
        &self,
        assets: &[OverlayAsset],
        mode: DisplayMode,
        total_duration: f64,
    ) -> PlanResult<Vec<AnimationInstruction>> {
        if assets.is_empty() {
            return Ok(Vec::new());
        }
        if !total_duration.is_finite() || total_duration <= 0.0 {
            return Err(PlanError::InvalidDuration(total_duration));
        }

        let instructions = match mode {
            DisplayMode::Sequential => plan_sequential(assets, total_duration),
            DisplayMode::Overlay => plan_overlay(assets, total_duration),
            DisplayMode::Slide => plan_slide(assets, total_duration),
        };

        Ok(instructions)
    }
}

/// Even, contiguous, non-overlapping windows; one asset visible at a
/// time; transition type cycles fade / slide-up / zoom-in.
fn plan_sequential(assets: &[OverlayAsset], total: f64) -> Vec<AnimationInstruction> {
    let slot = total / assets.len() as f64;

    assets
        .iter()
        .enumerate()
        .map(|(i, asset)| {
            let start = slot * i as f64;
            let end = if i == assets.len() - 1 {
                total
            } else {
                slot * (i + 1) as f64
            };
            let transition = TransitionType::CYCLE[i % TransitionType::CYCLE.len()];
            AnimationInstruction {
                slot: asset.slot.clone(),
                image_path: asset.image_path.clone(),
                start,
                end,
                transition,
                transition_duration: clamp_transition(transition.duration_secs(), slot),
            }
        })
        .collect()
}

/// Every asset spans the full duration; fade-ins start staggered so the
/// stack builds up visibly.
fn plan_overlay(assets: &[OverlayAsset], total: f64) -> Vec<AnimationInstruction> {
    // Compress the stagger when many assets would push the last fade-in
    // past the midpoint of the clip.
    let budget = total / 2.0;
    let natural = DEFAULT_STAGGER_SECS * assets.len() as f64;
    let stagger = if natural > budget {
        budget / assets.len() as f64
    } else {
        DEFAULT_STAGGER_SECS
    };

    assets
        .iter()
        .enumerate()
        .map(|(i, asset)| {
            let start = stagger * i as f64;
            AnimationInstruction {
                slot: asset.slot.clone(),
                image_path: asset.image_path.clone(),
                start,
                end: total,
                transition: TransitionType::Fade,
                transition_duration: clamp_transition(
                    TransitionType::Fade.duration_secs(),
                    total - start,
                ),
            }
        })
        .collect()
}

/// Horizontal slide-in windows. Windows are contiguous, so the previous
/// asset's exit (its window end) completes before the next entrance
/// begins.
fn plan_slide(assets: &[OverlayAsset], total: f64) -> Vec<AnimationInstruction> {
    let slot = total / assets.len() as f64;

    assets
        .iter()
        .enumerate()
        .map(|(i, asset)| {
            let start = slot * i as f64;
            let end = if i == assets.len() - 1 {
                total
            } else {
                slot * (i + 1) as f64
            };
            AnimationInstruction {
                slot: asset.slot.clone(),
                image_path: asset.image_path.clone(),
                start,
                end,
                transition: TransitionType::SlideIn,
                transition_duration: clamp_transition(TransitionType::SlideIn.duration_secs(), slot),
            }
        })
        .collect()
}

/// Keep a transition within half its window so the asset rests fully
/// visible for at least as long as it animates.
fn clamp_transition(natural: f64, window: f64) -> f64 {
    natural.min(window / 2.0)
}
