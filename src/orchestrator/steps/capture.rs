//! Capture step - overlay images with graceful degradation.

use crate::capture::CaptureError;
use crate::orchestrator::errors::StepResult;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, OverlayOutput, StepOutcome};

/// Captures overlay images for the request's capture target.
///
/// Capture exhaustion is recoverable: the job degrades to a
/// caption-only render instead of aborting.
#[derive(Debug, Default)]
pub struct CaptureStep;

impl CaptureStep {
    pub fn new() -> Self {
        Self
    }
}

impl PipelineStep for CaptureStep {
    fn name(&self) -> &str {
        "Capture"
    }

    fn description(&self) -> &str {
        "Capture overlay images with caching and retry"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let target = match ctx.request.capture {
            Some(ref target) => target,
            None => {
                state.overlays = Some(OverlayOutput::default());
                return Ok(StepOutcome::Skipped("no capture target".to_string()));
            }
        };

        match ctx.services.capture.capture(target) {
            Ok(assets) => {
                let cached = assets.iter().filter(|a| a.from_cache).count();
                ctx.logger.info(&format!(
                    "Captured {} overlay(s) ({} from cache)",
                    assets.len(),
                    cached
                ));
                state.overlays = Some(OverlayOutput {
                    assets,
                    degraded: false,
                });
                Ok(StepOutcome::Success)
            }
            Err(CaptureError::Exhausted {
                attempts,
                last_error,
            }) => {
                ctx.logger.warn(&format!(
                    "Capture exhausted after {} attempts ({}); continuing caption-only",
                    attempts, last_error
                ));
                state.overlays = Some(OverlayOutput {
                    assets: Vec::new(),
                    degraded: true,
                });
                Ok(StepOutcome::Skipped(
                    "capture exhausted, caption-only render".to_string(),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        // Success requires at least the primary asset on disk.
        if let Some(ref output) = state.overlays {
            for asset in &output.assets {
                if !asset.image_path.exists() {
                    return Err(crate::orchestrator::errors::StepError::invalid_output(
                        format!("overlay image missing: {}", asset.image_path.display()),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_has_correct_name() {
        assert_eq!(CaptureStep::new().name(), "Capture");
    }
}
