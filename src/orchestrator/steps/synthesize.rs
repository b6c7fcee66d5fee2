//! Synthesize step - narration text to cached audio.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};

/// Synthesizes the narration audio (or serves it from cache).
#[derive(Debug, Default)]
pub struct SynthesizeStep;

impl SynthesizeStep {
    pub fn new() -> Self {
        Self
    }
}

impl PipelineStep for SynthesizeStep {
    fn name(&self) -> &str {
        "Synthesize"
    }

    fn description(&self) -> &str {
        "Synthesize narration audio with caching"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if ctx.request.narration.trim().is_empty() {
            return Err(StepError::invalid_input("narration text is empty"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let artifact = ctx
            .services
            .synthesizer
            .synthesize(&ctx.request.narration, &ctx.request.voice)?;

        ctx.logger.info(&format!(
            "Audio ready: {:.2}s ({})",
            artifact.duration_seconds,
            artifact.file_path.display()
        ));

        state.audio = Some(artifact);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let audio = state
            .audio
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("audio not recorded"))?;

        if !audio.file_path.exists() {
            return Err(StepError::invalid_output(format!(
                "audio file missing: {}",
                audio.file_path.display()
            )));
        }
        if audio.duration_seconds <= 0.0 {
            return Err(StepError::invalid_output("audio duration is zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_has_correct_name() {
        assert_eq!(SynthesizeStep::new().name(), "Synthesize");
    }
}
