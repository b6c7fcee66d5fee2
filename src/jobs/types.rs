//! Render queue entry types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::RenderRequest;

/// Status of a job in the render queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RenderQueueStatus {
    /// Waiting to be processed.
    #[default]
    Queued,
    /// Currently being processed.
    Processing,
    /// Completed successfully.
    Complete,
    /// Failed with error.
    Error,
}

impl RenderQueueStatus {
    /// Get display string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::Processing => "Processing",
            Self::Complete => "Complete",
            Self::Error => "Error",
        }
    }
}

/// A single job in the render queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderQueueEntry {
    /// Unique job identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// The render request to process.
    pub request: RenderRequest,
    /// Current status.
    #[serde(default)]
    pub status: RenderQueueStatus,
    /// Error message if status is Error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Finished output path if status is Complete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

impl RenderQueueEntry {
    /// Create a new queued job.
    pub fn new(id: String, name: String, request: RenderRequest) -> Self {
        Self {
            id,
            name,
            request,
            status: RenderQueueStatus::Queued,
            error_message: None,
            output_path: None,
        }
    }

    /// Mark the entry complete with its output path.
    pub fn mark_complete(&mut self, output_path: PathBuf) {
        self.status = RenderQueueStatus::Complete;
        self.output_path = Some(output_path);
        self.error_message = None;
    }

    /// Mark the entry failed with an error message.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = RenderQueueStatus::Error;
        self.error_message = Some(error.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VoiceParams;

    fn request() -> RenderRequest {
        RenderRequest::new("hello", VoiceParams::new("mark"), "/bg.mp4", "out.mp4")
    }

    #[test]
    fn status_display() {
        assert_eq!(RenderQueueStatus::Queued.as_str(), "Queued");
        assert_eq!(RenderQueueStatus::Error.as_str(), "Error");
    }

    #[test]
    fn entry_state_transitions() {
        let mut entry = RenderQueueEntry::new("j1".to_string(), "job".to_string(), request());
        assert_eq!(entry.status, RenderQueueStatus::Queued);

        entry.mark_failed("encoder died");
        assert_eq!(entry.status, RenderQueueStatus::Error);
        assert!(entry.error_message.is_some());

        entry.mark_complete(PathBuf::from("/out/j1.mp4"));
        assert_eq!(entry.status, RenderQueueStatus::Complete);
        assert!(entry.error_message.is_none());
    }
}
