//! Compose step - final mux into the output file.

use crate::compose::ComposeInputs;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};

/// Muxes background, audio, overlays and captions into one file.
#[derive(Debug, Default)]
pub struct ComposeStep;

impl ComposeStep {
    pub fn new() -> Self {
        Self
    }
}

impl PipelineStep for ComposeStep {
    fn name(&self) -> &str {
        "Compose"
    }

    fn description(&self) -> &str {
        "Encode and mux the final video"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if ctx.request.output_name.trim().is_empty() {
            return Err(StepError::invalid_input("output name is empty"));
        }
        std::fs::create_dir_all(&ctx.output_dir)
            .map_err(|e| StepError::io_error("creating output directory", e))?;
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let audio = state
            .audio
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("audio not synthesized"))?;
        let background = state
            .background
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("background not fitted"))?;
        let captions = state
            .captions
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("captions not segmented"))?;
        let animation = state.animation.as_deref().unwrap_or(&[]);

        let output_path = ctx.output_path();
        ctx.logger
            .info(&format!("Output: {}", output_path.display()));

        ctx.logger.section("Executing ffmpeg");
        let inputs = ComposeInputs {
            background,
            audio,
            captions,
            overlays: animation,
            display_mode: ctx.request.display_mode,
        };
        let output = ctx
            .services
            .composer
            .compose(&inputs, &output_path, Some(ctx.logger.as_ref()))?;

        ctx.logger.success(&format!(
            "Rendered: {}",
            output
                .output_path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
        ));

        state.compose = Some(output);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let compose = state
            .compose
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("compose results not recorded"))?;

        if !compose.output_path.exists() {
            return Err(StepError::invalid_output(format!(
                "output file not created: {}",
                compose.output_path.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_has_correct_name() {
        assert_eq!(ComposeStep::new().name(), "Compose");
    }
}
