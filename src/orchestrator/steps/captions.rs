//! Captions step - narration plus audio duration to timed chunks.

use crate::captions::segment;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};

/// Splits narration into caption chunks timed against the audio.
#[derive(Debug, Default)]
pub struct CaptionsStep;

impl CaptionsStep {
    pub fn new() -> Self {
        Self
    }
}

impl PipelineStep for CaptionsStep {
    fn name(&self) -> &str {
        "Captions"
    }

    fn description(&self) -> &str {
        "Segment narration into timed caption chunks"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if ctx.words_per_chunk() == 0 {
            return Err(StepError::invalid_input("words_per_chunk must be at least 1"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let duration = state
            .audio_duration()
            .ok_or_else(|| StepError::precondition_failed("audio not synthesized"))?;

        let chunks = segment(&ctx.request.narration, duration, ctx.words_per_chunk())?;
        ctx.logger.info(&format!(
            "{} caption chunks over {:.2}s",
            chunks.len(),
            duration
        ));

        state.captions = Some(chunks);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let captions = state
            .captions
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("captions not recorded"))?;

        // Contiguity invariant: last chunk must end exactly at the audio
        // duration.
        if let (Some(last), Some(duration)) = (captions.last(), state.audio_duration()) {
            if (last.end - duration).abs() > 1e-6 {
                return Err(StepError::invalid_output(format!(
                    "last caption ends at {:.6}, audio ends at {:.6}",
                    last.end, duration
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
        assert_eq!(CaptionsStep::new().name(), "Captions");
    }
}
