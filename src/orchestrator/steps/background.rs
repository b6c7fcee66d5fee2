//! Background step - fit the source clip to the audio duration.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};

/// Fits the background clip to the audio duration and target aspect.
#[derive(Debug, Default)]
pub struct BackgroundStep;

impl BackgroundStep {
    pub fn new() -> Self {
        Self
    }
}

impl PipelineStep for BackgroundStep {
    fn name(&self) -> &str {
        "Background"
    }

    fn description(&self) -> &str {
        "Fit background clip to target duration and aspect ratio"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if !ctx.request.background.exists() {
            return Err(StepError::invalid_input(format!(
                "background clip not found: {}",
                ctx.request.background.display()
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let duration = state
            .audio_duration()
            .ok_or_else(|| StepError::precondition_failed("audio not synthesized"))?;

        // Seed window selection with the job id so re-renders of the
        // same job pick the same window.
        let spec = ctx
            .services
            .fitter
            .fit(&ctx.request.background, duration, &state.job_id)?;

        ctx.logger.info(&format!(
            "Background: {} loop(s), offset {:.2}s, crop {}x{}",
            spec.loop_count, spec.start_offset, spec.crop.width, spec.crop.height
        ));

        state.background = Some(spec);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let spec = state
            .background
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("background spec not recorded"))?;

        if let Some(duration) = state.audio_duration() {
            if (spec.duration - duration).abs() > 1e-6 {
                return Err(StepError::invalid_output(format!(
                    "background covers {:.6}s, audio runs {:.6}s",
                    spec.duration, duration
                )));
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
        assert_eq!(BackgroundStep::new().name(), "Background");
    }
}
