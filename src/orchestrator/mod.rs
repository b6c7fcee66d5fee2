//! Render pipeline orchestrator.
//!
//! This module provides the infrastructure for running a render job
//! through its stages. Each job is a sequence of steps that validate,
//! execute, and record their results into the job state.
//!
//! # Architecture
//!
//! ```text
//! Pipeline
//!     ├── Step: Synthesize   (audio, cached)
//!     ├── Step: Captions     (needs audio duration)
//!     ├── Step: Background   (fit to audio duration)
//!     ├── Step: Capture      (overlays, degrades gracefully)
//!     ├── Step: Animate      (overlay timing plan)
//!     └── Step: Compose      (ffmpeg mux, atomic output)
//! ```
//!
//! Stages within one job run sequentially because each stage's output
//! feeds the next; across jobs, `QueueProcessor::process_queue_parallel`
//! runs a bounded worker pool.

mod errors;
mod pipeline;
mod queue_processor;
mod step;
pub mod steps;
mod types;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{CancelHandle, Pipeline, PipelineRunResult};
pub use queue_processor::{JobResult, QueueProcessor};
pub use step::PipelineStep;
pub use steps::{
    AnimateStep, BackgroundStep, CaptionsStep, CaptureStep, ComposeStep, SynthesizeStep,
};
pub use types::{Context, JobState, OverlayOutput, ProgressCallback, RenderServices, StepOutcome};

/// Create the standard render pipeline with all steps in order.
///
/// 1. Synthesize - narration to cached audio
/// 2. Captions - proportional caption timing
/// 3. Background - fit clip to audio duration
/// 4. Capture - overlay images (recoverable)
/// 5. Animate - overlay timing plan
/// 6. Compose - final encode and mux
pub fn create_standard_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(SynthesizeStep::new())
        .with_step(CaptionsStep::new())
        .with_step(BackgroundStep::new())
        .with_step(CaptureStep::new())
        .with_step(AnimateStep::new())
        .with_step(ComposeStep::new())
}
