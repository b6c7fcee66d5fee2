//! Queue processor for running render jobs.
//!
//! Takes jobs from the render queue and runs them through the standard
//! pipeline, sequentially or on a bounded worker pool.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Settings;
use crate::jobs::RenderQueueEntry;
use crate::logging::{JobLogger, LogCallback, LogConfig};

use super::pipeline::CancelHandle;
use super::types::{Context, JobState, ProgressCallback, RenderServices};
use super::{create_standard_pipeline, PipelineRunResult};

/// Result of processing a single job.
#[derive(Debug, Clone)]
pub struct JobResult {
    /// Job ID that was processed.
    pub job_id: String,
    /// Whether the job completed successfully.
    pub success: bool,
    /// Path to output file (if successful).
    pub output_path: Option<PathBuf>,
    /// Error message (if failed).
    pub error: Option<String>,
    /// Steps that completed.
    pub steps_completed: Vec<String>,
    /// Steps that were skipped.
    pub steps_skipped: Vec<String>,
}

impl JobResult {
    /// Create a successful result.
    pub fn success(job_id: String, output_path: PathBuf, run_result: PipelineRunResult) -> Self {
        Self {
            job_id,
            success: true,
            output_path: Some(output_path),
            error: None,
            steps_completed: run_result.steps_completed,
            steps_skipped: run_result.steps_skipped,
        }
    }

    /// Create a failed result.
    pub fn failure(job_id: String, error: impl Into<String>) -> Self {
        Self {
            job_id,
            success: false,
            output_path: None,
            error: Some(error.into()),
            steps_completed: Vec::new(),
            steps_skipped: Vec::new(),
        }
    }
}

/// Processor for running queue entries through the pipeline.
///
/// The shared services (and through them the shared caches) are reused
/// across jobs, so a later job that repeats narration or capture
/// content hits the caches populated by an earlier one.
pub struct QueueProcessor {
    settings: Settings,
    services: Arc<RenderServices>,
    log_dir: PathBuf,
    work_dir: PathBuf,
    output_dir: PathBuf,
}

impl QueueProcessor {
    /// Create a new queue processor.
    pub fn new(
        settings: Settings,
        services: Arc<RenderServices>,
        log_dir: PathBuf,
        work_dir: PathBuf,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            settings,
            services,
            log_dir,
            work_dir,
            output_dir,
        }
    }

    /// Create a processor with production services and directories from
    /// settings.
    pub fn from_settings(settings: Settings) -> Self {
        let services = Arc::new(RenderServices::from_settings(&settings));
        let log_dir = PathBuf::from(&settings.paths.logs_folder);
        let work_dir = PathBuf::from(&settings.paths.temp_root);
        let output_dir = PathBuf::from(&settings.paths.output_folder);
        Self::new(settings, services, log_dir, work_dir, output_dir)
    }

    /// Process a single job from the queue.
    pub fn process_job(
        &self,
        entry: &RenderQueueEntry,
        log_callback: Option<LogCallback>,
        progress_callback: Option<ProgressCallback>,
    ) -> JobResult {
        // Job-specific working directory
        let job_work_dir = self.work_dir.join(&entry.id);
        if let Err(e) = std::fs::create_dir_all(&job_work_dir) {
            return JobResult::failure(
                entry.id.clone(),
                format!("Failed to create work directory: {}", e),
            );
        }

        let logger = match JobLogger::new(
            &entry.name,
            &self.log_dir,
            LogConfig::default(),
            log_callback,
        ) {
            Ok(l) => Arc::new(l),
            Err(e) => {
                return JobResult::failure(
                    entry.id.clone(),
                    format!("Failed to create logger: {}", e),
                );
            }
        };

        let mut ctx = Context::new(
            entry.request.clone(),
            self.settings.clone(),
            &entry.name,
            job_work_dir,
            self.output_dir.clone(),
            logger,
            Arc::clone(&self.services),
        );

        if let Some(callback) = progress_callback {
            ctx = ctx.with_progress_callback(callback);
        }

        let mut state = JobState::new(&entry.id);
        let pipeline = create_standard_pipeline();

        ctx.logger.info(&format!("Starting job: {}", entry.name));
        ctx.logger.info(&format!(
            "Narration: {} words, voice '{}'",
            entry.request.narration.split_whitespace().count(),
            entry.request.voice.voice_id
        ));

        match pipeline.run(&ctx, &mut state) {
            Ok(run_result) => {
                let output_path = state
                    .compose
                    .as_ref()
                    .map(|c| c.output_path.clone())
                    .unwrap_or_else(|| ctx.output_path());

                ctx.logger
                    .info(&format!("Job completed: {}", output_path.display()));
                JobResult::success(entry.id.clone(), output_path, run_result)
            }
            Err(e) => {
                let error_msg = format!("Pipeline failed: {}", e);
                ctx.logger.error(&error_msg);
                JobResult::failure(entry.id.clone(), error_msg)
            }
        }
    }

    /// Process jobs sequentially, stopping between jobs on cancellation.
    pub fn process_queue(
        &self,
        entries: &[RenderQueueEntry],
        cancel_handle: Option<&CancelHandle>,
    ) -> Vec<JobResult> {
        let mut results = Vec::with_capacity(entries.len());

        for (i, entry) in entries.iter().enumerate() {
            if let Some(handle) = cancel_handle {
                if handle.is_cancelled() {
                    tracing::info!("Queue processing cancelled at job {}/{}", i + 1, entries.len());
                    break;
                }
            }

            tracing::info!("Processing job {}/{}: {}", i + 1, entries.len(), entry.name);
            results.push(self.process_job(entry, None, None));
        }

        results
    }

    /// Process jobs on the worker pool sized by the `render.workers`
    /// setting.
    pub fn process_queue_bounded(
        &self,
        entries: &[RenderQueueEntry],
        cancel_handle: Option<&CancelHandle>,
    ) -> Vec<JobResult> {
        self.process_queue_parallel(entries, self.settings.render.workers, cancel_handle)
    }

    /// Process jobs on a bounded worker pool.
    ///
    /// At most `workers` jobs encode at once (encoder/CPU contention is
    /// the bound that matters). No cross-job ordering is guaranteed: a
    /// later job that is a full cache hit may finish before an earlier
    /// miss. Results come back in entry order regardless.
    pub fn process_queue_parallel(
        &self,
        entries: &[RenderQueueEntry],
        workers: usize,
        cancel_handle: Option<&CancelHandle>,
    ) -> Vec<JobResult> {
        if entries.is_empty() {
            return Vec::new();
        }
        let workers = workers.clamp(1, entries.len());

        let next_index = AtomicUsize::new(0);
        let results: Mutex<Vec<Option<JobResult>>> = Mutex::new(vec![None; entries.len()]);

        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    if let Some(handle) = cancel_handle {
                        if handle.is_cancelled() {
                            break;
                        }
                    }

                    let index = next_index.fetch_add(1, Ordering::SeqCst);
                    if index >= entries.len() {
                        break;
                    }

                    let entry = &entries[index];
                    tracing::info!(
                        "Worker processing job {}/{}: {}",
                        index + 1,
                        entries.len(),
                        entry.name
                    );
                    let result = self.process_job(entry, None, None);
                    results.lock()[index] = Some(result);
                });
            }
        });

        results
            .into_inner()
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.unwrap_or_else(|| {
                    JobResult::failure(entries[i].id.clone(), "cancelled before start")
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{ProviderFailure, SpeechProvider, SynthesizedSpeech};
    use crate::capture::{CaptureBatch, CaptureDriver, DriverFailure, ViewportOptions};
    use crate::models::{OverlayStyle, RenderRequest, VoiceParams};
    use tempfile::tempdir;

    struct FakeProvider;

    impl SpeechProvider for FakeProvider {
        fn synthesize(
            &self,
            text: &str,
            _voice: &VoiceParams,
        ) -> Result<SynthesizedSpeech, ProviderFailure> {
            Ok(SynthesizedSpeech {
                audio: text.as_bytes().to_vec(),
                duration_seconds: 5.0,
                extension: "mp3".to_string(),
            })
        }
    }

    struct FakeDriver;

    impl CaptureDriver for FakeDriver {
        fn capture(
            &self,
            _locator: &str,
            _viewport: &ViewportOptions,
            _style: &OverlayStyle,
            _max_secondary: usize,
        ) -> Result<CaptureBatch, DriverFailure> {
            Ok(CaptureBatch {
                primary: b"png".to_vec(),
                secondary: Vec::new(),
            })
        }
    }

    fn processor(root: &std::path::Path) -> QueueProcessor {
        let settings = Settings::default();
        let services = Arc::new(RenderServices::new(
            &settings,
            Arc::new(FakeProvider),
            Arc::new(FakeDriver),
            root.join("cache"),
        ));
        QueueProcessor::new(
            settings,
            services,
            root.join("logs"),
            root.join("work"),
            root.join("out"),
        )
    }

    fn entry(id: &str, narration: &str, background: &str) -> RenderQueueEntry {
        RenderQueueEntry::new(
            id.to_string(),
            format!("job_{}", id),
            RenderRequest::new(
                narration,
                VoiceParams::new("mark"),
                background,
                format!("{}.mp4", id),
            ),
        )
    }

    #[test]
    fn missing_background_fails_at_the_background_step() {
        let dir = tempdir().unwrap();
        let processor = processor(dir.path());

        let result = processor.process_job(
            &entry("j1", "hello world", "/nonexistent/bg.mp4"),
            None,
            None,
        );

        assert!(!result.success);
        let error = result.error.unwrap();
        assert!(error.contains("Background"), "error was: {}", error);
        assert!(error.contains("job_j1"));
    }

    #[test]
    fn empty_narration_fails_at_synthesize() {
        let dir = tempdir().unwrap();
        let processor = processor(dir.path());

        let result = processor.process_job(&entry("j2", "   ", "/nonexistent/bg.mp4"), None, None);

        assert!(!result.success);
        assert!(result.error.unwrap().contains("Synthesize"));
    }

    #[test]
    fn parallel_processing_returns_a_result_per_entry() {
        let dir = tempdir().unwrap();
        let processor = processor(dir.path());

        let entries: Vec<RenderQueueEntry> = (0..4)
            .map(|i| entry(&format!("p{}", i), "some words here", "/nonexistent/bg.mp4"))
            .collect();

        let results = processor.process_queue_bounded(&entries, None);

        assert_eq!(results.len(), 4);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.job_id, format!("p{}", i));
            assert!(!result.success);
        }
    }

    #[test]
    fn sequential_processing_respects_cancellation() {
        let dir = tempdir().unwrap();
        let processor = processor(dir.path());

        let pipeline = create_standard_pipeline();
        let handle = pipeline.cancel_handle();
        handle.cancel();

        let entries = vec![entry("c1", "words", "/nonexistent/bg.mp4")];
        let results = processor.process_queue(&entries, Some(&handle));
        assert!(results.is_empty());
    }

    #[test]
    fn job_result_constructors() {
        let run_result = PipelineRunResult {
            steps_completed: vec!["Synthesize".to_string()],
            steps_skipped: vec!["Capture".to_string()],
        };
        let ok = JobResult::success("a".to_string(), PathBuf::from("/out/a.mp4"), run_result);
        assert!(ok.success);
        assert_eq!(ok.steps_completed.len(), 1);

        let bad = JobResult::failure("b".to_string(), "boom");
        assert!(!bad.success);
        assert_eq!(bad.error.as_deref(), Some("boom"));
    }
}
