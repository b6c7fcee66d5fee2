//! Error types for the render pipeline.
//!
//! Errors carry context that chains through layers:
//! Job → Step → Stage error → Detail. A failure surfaces as one
//! summarized message naming its originating stage, never a raw
//! backtrace.

use std::io;

use thiserror::Error;

use crate::animation::PlanError;
use crate::audio::SynthesisError;
use crate::background::BackgroundError;
use crate::cache::CacheError;
use crate::captions::SegmentError;
use crate::capture::CaptureError;
use crate::compose::ComposeError;

/// Top-level pipeline error with job context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed during execution.
    #[error("Job '{job_name}' failed at step '{step_name}': {source}")]
    StepFailed {
        job_name: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// Input validation failed before the pipeline started.
    #[error("Job '{job_name}' failed validation: {message}")]
    ValidationFailed { job_name: String, message: String },

    /// Pipeline was cancelled.
    #[error("Job '{job_name}' was cancelled")]
    Cancelled { job_name: String },

    /// Failed to set up the job (create directories, etc.).
    #[error("Job '{job_name}' setup failed: {message}")]
    SetupFailed { job_name: String, message: String },
}

impl PipelineError {
    /// Create a step failed error.
    pub fn step_failed(
        job_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            job_name: job_name.into(),
            step_name: step_name.into(),
            source,
        }
    }

    /// Create a validation failed error.
    pub fn validation_failed(job_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            job_name: job_name.into(),
            message: message.into(),
        }
    }

    /// Create a setup failed error.
    pub fn setup_failed(job_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            job_name: job_name.into(),
            message: message.into(),
        }
    }

    /// Create a cancelled error.
    pub fn cancelled(job_name: impl Into<String>) -> Self {
        Self::Cancelled {
            job_name: job_name.into(),
        }
    }
}

/// Error from a pipeline step with stage context.
#[derive(Error, Debug)]
pub enum StepError {
    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// Output validation failed.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// A prior stage's output is missing.
    #[error("Precondition not met: {0}")]
    PreconditionFailed(String),

    /// Audio synthesis failed.
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    /// Caption segmentation failed.
    #[error(transparent)]
    Segment(#[from] SegmentError),

    /// Background fitting failed.
    #[error(transparent)]
    Background(#[from] BackgroundError),

    /// Overlay capture failed fatally (exhaustion is handled inside the
    /// capture step and degrades the render instead).
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// Animation planning failed.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// Final composition failed.
    #[error(transparent)]
    Compose(#[from] ComposeError),

    /// Cache operation failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl StepError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an invalid output error.
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    /// Create a precondition failed error.
    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }

    /// Create an I/O error with context.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
