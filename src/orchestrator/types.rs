//! Core types for the render pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::animation::AnimationCompositor;
use crate::audio::{AudioSynthesizer, CommandSpeechProvider, SpeechProvider};
use crate::background::BackgroundFitter;
use crate::cache::{CacheStore, FsCacheStore};
use crate::capture::{CaptureDriver, ChromiumDriver, OverlayCaptureService};
use crate::compose::{ComposeOutput, VideoComposer};
use crate::config::Settings;
use crate::logging::JobLogger;
use crate::models::{
    AnimationInstruction, AudioArtifact, BackgroundSpec, CaptionChunk, OverlayAsset, RenderRequest,
    RenderState,
};

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (step_name, percent_complete, message)
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// The stage services one pipeline run draws on.
///
/// Shared across concurrent jobs: the synthesizer and capture service
/// wrap the shared caches, so per-key locking happens inside them.
pub struct RenderServices {
    pub synthesizer: AudioSynthesizer,
    pub capture: OverlayCaptureService,
    pub fitter: BackgroundFitter,
    pub compositor: AnimationCompositor,
    pub composer: VideoComposer,
}

impl RenderServices {
    /// Wire up production services from settings: command-backed speech
    /// provider, headless-browser capture driver, filesystem caches.
    pub fn from_settings(settings: &Settings) -> Self {
        let cache_root = PathBuf::from(&settings.paths.cache_root);
        let provider: Arc<dyn SpeechProvider> = Arc::new(CommandSpeechProvider::new(
            settings.audio.synth_command.clone(),
            settings.audio.audio_format.clone(),
        ));
        let driver: Arc<dyn CaptureDriver> = Arc::new(
            ChromiumDriver::new(&settings.capture.browser_binary)
                .with_timeout_secs(settings.capture.timeout_secs),
        );

        Self::new(settings, provider, driver, cache_root)
    }

    /// Wire up services with injected collaborators (tests swap in
    /// fakes here).
    pub fn new(
        settings: &Settings,
        provider: Arc<dyn SpeechProvider>,
        driver: Arc<dyn CaptureDriver>,
        cache_root: PathBuf,
    ) -> Self {
        let audio_store: Arc<dyn CacheStore> =
            Arc::new(FsCacheStore::new(cache_root.join("audio")));
        let overlay_store: Arc<dyn CacheStore> =
            Arc::new(FsCacheStore::new(cache_root.join("overlays")));

        Self {
            synthesizer: AudioSynthesizer::new(provider, audio_store),
            capture: OverlayCaptureService::new(driver, overlay_store)
                .with_viewport(settings.viewport()),
            fitter: BackgroundFitter::new(settings.resolution()),
            compositor: AnimationCompositor::new(),
            composer: VideoComposer::new(settings.video.fps, settings.caption_style())
                .with_encoder(settings.video.encoder_preset.clone(), settings.video.crf),
        }
    }
}

/// Read-only context passed to pipeline steps.
///
/// Contains the request, configuration and shared services that steps
/// can read but not modify. Mutable state goes in `JobState`.
pub struct Context {
    /// The render request being processed.
    pub request: RenderRequest,
    /// Application settings.
    pub settings: Settings,
    /// Job name/identifier.
    pub job_name: String,
    /// Job-specific working directory (under temp_root).
    pub work_dir: PathBuf,
    /// Output directory for the finished video.
    pub output_dir: PathBuf,
    /// Per-job logger.
    pub logger: Arc<JobLogger>,
    /// Shared stage services.
    pub services: Arc<RenderServices>,
    /// Optional progress callback.
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    /// Create a new context for a job.
    pub fn new(
        request: RenderRequest,
        settings: Settings,
        job_name: impl Into<String>,
        work_dir: PathBuf,
        output_dir: PathBuf,
        logger: Arc<JobLogger>,
        services: Arc<RenderServices>,
    ) -> Self {
        Self {
            request,
            settings,
            job_name: job_name.into(),
            work_dir,
            output_dir,
            logger,
            services,
            progress_callback: None,
        }
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to callback (if set).
    pub fn report_progress(&self, step_name: &str, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(step_name, percent, message);
        }
    }

    /// Words per caption chunk for this job.
    pub fn words_per_chunk(&self) -> usize {
        self.request
            .words_per_chunk
            .unwrap_or(self.settings.captions.words_per_chunk)
    }

    /// Final output path for this job.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.request.output_name)
    }
}

/// Overlay capture results, including the degraded (caption-only) case.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverlayOutput {
    /// Captured assets (empty when degraded).
    pub assets: Vec<OverlayAsset>,
    /// Capture was exhausted and the render fell back to caption-only.
    pub degraded: bool,
}

/// Mutable job state that accumulates results from pipeline steps.
///
/// This is the "write-once manifest": steps add new data but do not
/// overwrite previous stages' output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobState {
    /// Unique job identifier.
    pub job_id: String,
    /// When the job started.
    pub started_at: Option<String>,
    /// Render state machine. `Failed` is terminal.
    #[serde(default)]
    pub state: RenderState,
    /// Synthesized audio (from Synthesize step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioArtifact>,
    /// Timed caption chunks (from Captions step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captions: Option<Vec<CaptionChunk>>,
    /// Background fit plan (from Background step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<BackgroundSpec>,
    /// Overlay capture results (from Capture step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlays: Option<OverlayOutput>,
    /// Overlay animation plan (from Animate step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation: Option<Vec<AnimationInstruction>>,
    /// Composition record (from Compose step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compose: Option<ComposeOutput>,
}

impl JobState {
    /// Create a new job state with the given ID.
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// Check if audio has been synthesized.
    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    /// Audio duration, once synthesized.
    pub fn audio_duration(&self) -> Option<f64> {
        self.audio.as_ref().map(|a| a.duration_seconds)
    }

    /// Overlay assets available for animation (empty when capture was
    /// skipped or degraded).
    pub fn overlay_assets(&self) -> &[OverlayAsset] {
        self.overlays
            .as_ref()
            .map(|o| o.assets.as_slice())
            .unwrap_or(&[])
    }
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (preconditions not met, but not an error).
    Skipped(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VoiceParams;

    #[test]
    fn job_state_tracks_completion() {
        let mut state = JobState::new("test-123");
        assert!(!state.has_audio());
        assert_eq!(state.state, RenderState::Pending);

        state.audio = Some(AudioArtifact {
            fingerprint: "fp".to_string(),
            file_path: PathBuf::from("/cache/fp/audio.mp3"),
            duration_seconds: 12.5,
            voice: VoiceParams::new("mark"),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        });

        assert!(state.has_audio());
        assert_eq!(state.audio_duration(), Some(12.5));
    }

    #[test]
    fn job_state_serializes() {
        let state = JobState::new("test-456");
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"job_id\":\"test-456\""));
        assert!(json.contains("\"state\":\"pending\""));
    }

    #[test]
    fn overlay_assets_default_to_empty() {
        let state = JobState::new("test-789");
        assert!(state.overlay_assets().is_empty());
    }
}
