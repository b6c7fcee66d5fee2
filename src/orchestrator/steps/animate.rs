//! Animate step - plan overlay timing and transitions.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};

/// Plans per-overlay timing windows and entrance transitions.
#[derive(Debug, Default)]
pub struct AnimateStep;

impl AnimateStep {
    pub fn new() -> Self {
        Self
    }
}

impl PipelineStep for AnimateStep {
    fn name(&self) -> &str {
        "Animate"
    }

    fn description(&self) -> &str {
        "Plan overlay animation timing"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let assets = state.overlay_assets();
        if assets.is_empty() {
            state.animation = Some(Vec::new());
            return Ok(StepOutcome::Skipped("no overlay assets".to_string()));
        }

        let duration = state
            .audio_duration()
            .ok_or_else(|| StepError::precondition_failed("audio not synthesized"))?;

        let plan = ctx
            .services
            .compositor
            .plan(assets, ctx.request.display_mode, duration)?;

        ctx.logger.info(&format!(
            "{} animation instruction(s) in {} mode",
            plan.len(),
            ctx.request.display_mode
        ));

        state.animation = Some(plan);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let plan = state
            .animation
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("animation plan not recorded"))?;

        // Aggregate displayed time never exceeds the audio duration in
        // windowed modes; every asset must keep a window.
        if plan.len() != state.overlay_assets().len() {
            return Err(StepError::invalid_output(format!(
                "{} assets but {} instructions",
                state.overlay_assets().len(),
                plan.len()
            )));
        }
        if let Some(duration) = state.audio_duration() {
            for instr in plan {
                if instr.end > duration + 1e-6 || instr.start < -1e-6 {
                    return Err(StepError::invalid_output(format!(
                        "instruction for '{}' outside [0, {:.3}]",
                        instr.slot, duration
                    )));
                }
            }
        }
        Ok(())
    }
}
