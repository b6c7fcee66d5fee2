//! Video composer - runs the ffmpeg composition and manages output
//! atomicity.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::JobLogger;
use crate::models::{
    AnimationInstruction, AudioArtifact, BackgroundSpec, CaptionChunk, DisplayMode,
};

use super::filtergraph::{build_args, layout_overlays, CaptionStyle};

/// Errors from composition.
#[derive(Error, Debug)]
pub enum ComposeError {
    /// A required input file is missing before the encode starts.
    #[error("Missing composition input: {0}")]
    MissingInput(String),

    /// ffmpeg failed; the partial output has been deleted.
    #[error("Encoder failed with exit code {exit_code}: {message}")]
    Encoder { exit_code: i32, message: String },

    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

impl ComposeError {
    fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Result type for composition.
pub type ComposeResult<T> = Result<T, ComposeError>;

/// Inputs for one composition.
pub struct ComposeInputs<'a> {
    pub background: &'a BackgroundSpec,
    pub audio: &'a AudioArtifact,
    pub captions: &'a [CaptionChunk],
    pub overlays: &'a [AnimationInstruction],
    pub display_mode: DisplayMode,
}

/// Record of a finished composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeOutput {
    /// Final output file path.
    pub output_path: PathBuf,
    /// ffmpeg exit code (always 0 on success).
    pub exit_code: i32,
    /// The command that was run.
    pub command: String,
}

/// Composes the final video with ffmpeg.
pub struct VideoComposer {
    /// Path to the ffmpeg executable (None = find in PATH).
    ffmpeg_path: Option<PathBuf>,
    fps: u32,
    preset: String,
    crf: u32,
    caption_style: CaptionStyle,
}

impl VideoComposer {
    pub fn new(fps: u32, caption_style: CaptionStyle) -> Self {
        Self {
            ffmpeg_path: None,
            fps,
            preset: "medium".to_string(),
            crf: 21,
            caption_style,
        }
    }

    /// Use a custom ffmpeg executable.
    pub fn with_ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = Some(path.into());
        self
    }

    /// Override encoder preset and quality.
    pub fn with_encoder(mut self, preset: impl Into<String>, crf: u32) -> Self {
        self.preset = preset.into();
        self.crf = crf;
        self
    }

    fn ffmpeg_cmd(&self) -> &str {
        self.ffmpeg_path
            .as_ref()
            .and_then(|p| p.to_str())
            .unwrap_or("ffmpeg")
    }

    /// Compose the final video at `output_path`.
    ///
    /// The encode writes to `{output_path}.part` in the same directory
    /// and renames into place on success; any failure removes the
    /// partial file so the output directory never holds a broken render.
    pub fn compose(
        &self,
        inputs: &ComposeInputs<'_>,
        output_path: &Path,
        logger: Option<&JobLogger>,
    ) -> ComposeResult<ComposeOutput> {
        if !inputs.audio.file_path.exists() {
            return Err(ComposeError::MissingInput(format!(
                "audio file {}",
                inputs.audio.file_path.display()
            )));
        }
        if !inputs.background.source_path.exists() {
            return Err(ComposeError::MissingInput(format!(
                "background clip {}",
                inputs.background.source_path.display()
            )));
        }

        let placements = layout_overlays(
            &self.resolve_overlay_dimensions(inputs.overlays, logger),
            inputs.display_mode,
            inputs.background.target,
        );

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ComposeError::io("creating output directory", e))?;
        }

        // Temp file beside the final path keeps the rename atomic.
        let temp_path = partial_path(output_path);
        let args = build_args(
            inputs.background,
            &inputs.audio.file_path,
            inputs.captions,
            &placements,
            &self.caption_style,
            self.fps,
            &self.preset,
            self.crf,
            &temp_path,
        );

        let command_line = format!("{} {}", self.ffmpeg_cmd(), args.join(" "));
        if let Some(log) = logger {
            log.command(&command_line);
        }
        tracing::debug!("Running ffmpeg composition: {}", command_line);

        let result = Command::new(self.ffmpeg_cmd())
            .args(&args)
            .output()
            .map_err(|e| {
                let _ = std::fs::remove_file(&temp_path);
                ComposeError::io("executing ffmpeg", e)
            })?;

        if let Some(log) = logger {
            for line in String::from_utf8_lossy(&result.stderr).lines() {
                log.output_line(line, true);
            }
        }

        let exit_code = result.status.code().unwrap_or(-1);
        if exit_code != 0 {
            let _ = std::fs::remove_file(&temp_path);
            if let Some(log) = logger {
                log.show_tail("ffmpeg output");
            }
            return Err(ComposeError::Encoder {
                exit_code,
                message: last_stderr_line(&result.stderr),
            });
        }

        if !temp_path.exists() {
            return Err(ComposeError::Encoder {
                exit_code,
                message: "ffmpeg exited cleanly but produced no output".to_string(),
            });
        }

        std::fs::rename(&temp_path, output_path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            ComposeError::io("renaming output into place", e)
        })?;

        Ok(ComposeOutput {
            output_path: output_path.to_path_buf(),
            exit_code,
            command: command_line,
        })
    }

    /// Read overlay image dimensions; unreadable images are dropped with
    /// a warning rather than failing the whole render.
    fn resolve_overlay_dimensions(
        &self,
        overlays: &[AnimationInstruction],
        logger: Option<&JobLogger>,
    ) -> Vec<(AnimationInstruction, (u32, u32))> {
        overlays
            .iter()
            .filter_map(|instr| match image::image_dimensions(&instr.image_path) {
                Ok(dims) => Some((instr.clone(), dims)),
                Err(e) => {
                    let msg = format!(
                        "Skipping unreadable overlay {}: {}",
                        instr.image_path.display(),
                        e
                    );
                    if let Some(log) = logger {
                        log.warn(&msg);
                    }
                    tracing::warn!("{}", msg);
                    None
                }
            })
            .collect()
    }
}

/// Temp path the encode writes to before the atomic rename.
fn partial_path(output_path: &Path) -> PathBuf {
    let mut name = output_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "output.mp4".to_string());
    name.push_str(".part");
    output_path.with_file_name(name)
}

/// Last non-empty stderr line, for compact error messages.
fn last_stderr_line(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("no diagnostic output")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CropWindow, Resolution, VoiceParams};
    use tempfile::tempdir;

    fn artifact(path: PathBuf) -> AudioArtifact {
        AudioArtifact {
            fingerprint: "fp".to_string(),
            file_path: path,
            duration_seconds: 10.0,
            voice: VoiceParams::new("mark"),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn background(path: PathBuf) -> BackgroundSpec {
        BackgroundSpec {
            source_path: path,
            start_offset: 0.0,
            loop_count: 1,
            crop: CropWindow {
                x: 0,
                y: 0,
                width: 1080,
                height: 1920,
            },
            target: Resolution {
                width: 1080,
                height: 1920,
            },
            duration: 10.0,
        }
    }

    #[test]
    fn partial_path_appends_part_suffix() {
        assert_eq!(
            partial_path(Path::new("/out/video.mp4")),
            PathBuf::from("/out/video.mp4.part")
        );
    }

    #[test]
    fn missing_audio_is_rejected_before_encoding() {
        let dir = tempdir().unwrap();
        let bg_path = dir.path().join("bg.mp4");
        std::fs::write(&bg_path, b"clip").unwrap();

        let composer = VideoComposer::new(30, CaptionStyle::default());
        let inputs = ComposeInputs {
            background: &background(bg_path),
            audio: &artifact(dir.path().join("missing.mp3")),
            captions: &[],
            overlays: &[],
            display_mode: DisplayMode::Sequential,
        };

        let result = composer.compose(&inputs, &dir.path().join("out.mp4"), None);
        assert!(matches!(result, Err(ComposeError::MissingInput(_))));
    }

    #[test]
    fn failed_encode_leaves_no_partial_output() {
        let dir = tempdir().unwrap();
        let bg_path = dir.path().join("bg.mp4");
        let audio_path = dir.path().join("audio.mp3");
        std::fs::write(&bg_path, b"clip").unwrap();
        std::fs::write(&audio_path, b"audio").unwrap();

        // `false` exits nonzero without writing anything.
        let composer = VideoComposer::new(30, CaptionStyle::default()).with_ffmpeg_path("false");
        let inputs = ComposeInputs {
            background: &background(bg_path),
            audio: &artifact(audio_path),
            captions: &[],
            overlays: &[],
            display_mode: DisplayMode::Sequential,
        };

        let output = dir.path().join("out.mp4");
        let result = composer.compose(&inputs, &output, None);

        assert!(matches!(result, Err(ComposeError::Encoder { .. })));
        assert!(!output.exists());
        assert!(!partial_path(&output).exists());
    }

    #[test]
    fn clean_exit_without_output_is_an_encoder_error() {
        let dir = tempdir().unwrap();
        let bg_path = dir.path().join("bg.mp4");
        let audio_path = dir.path().join("audio.mp3");
        std::fs::write(&bg_path, b"clip").unwrap();
        std::fs::write(&audio_path, b"audio").unwrap();

        // `true` exits zero but produces no file.
        let composer = VideoComposer::new(30, CaptionStyle::default()).with_ffmpeg_path("true");
        let inputs = ComposeInputs {
            background: &background(bg_path),
            audio: &artifact(audio_path),
            captions: &[],
            overlays: &[],
            display_mode: DisplayMode::Sequential,
        };

        let result = composer.compose(&inputs, &dir.path().join("out.mp4"), None);
        assert!(matches!(result, Err(ComposeError::Encoder { .. })));
    }

    #[test]
    fn unreadable_overlays_are_skipped() {
        let composer = VideoComposer::new(30, CaptionStyle::default());
        let overlays = vec![AnimationInstruction {
            slot: "post".to_string(),
            image_path: PathBuf::from("/nonexistent/post.png"),
            start: 0.0,
            end: 5.0,
            transition: crate::models::TransitionType::Fade,
            transition_duration: 0.4,
        }];

        let resolved = composer.resolve_overlay_dimensions(&overlays, None);
        assert!(resolved.is_empty());
    }
}
