//! FFprobe wrappers for media inspection.
//!
//! Duration and stream geometry come from `ffprobe` invoked as a
//! subprocess; parse failures and nonzero exits surface as `ProbeError`.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

/// Errors from media probing.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Media file not found: {0}")]
    SourceNotFound(String),

    #[error("ffprobe failed: {0}")]
    FfprobeError(String),

    #[error("Failed to parse ffprobe output for {what}: {message}")]
    ParseError { what: String, message: String },
}

/// Result type for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Width/height of the first video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoGeometry {
    pub width: u32,
    pub height: u32,
}

/// Path to the ffprobe executable (None = find in PATH).
#[derive(Debug, Clone, Default)]
pub struct MediaProbe {
    ffprobe_path: Option<PathBuf>,
}

impl MediaProbe {
    pub fn new() -> Self {
        Self { ffprobe_path: None }
    }

    /// Use a custom ffprobe executable.
    pub fn with_ffprobe_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffprobe_path = Some(path.into());
        self
    }

    fn ffprobe_cmd(&self) -> &str {
        self.ffprobe_path
            .as_ref()
            .and_then(|p| p.to_str())
            .unwrap_or("ffprobe")
    }

    /// Get the duration of a media file in seconds.
    pub fn duration(&self, input_path: &Path) -> ProbeResult<f64> {
        if !input_path.exists() {
            return Err(ProbeError::SourceNotFound(
                input_path.display().to_string(),
            ));
        }

        let output = Command::new(self.ffprobe_cmd())
            .arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("default=noprint_wrappers=1:nokey=1")
            .arg(input_path)
            .output()
            .map_err(|e| ProbeError::FfprobeError(format!("Failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(ProbeError::FfprobeError(format!(
                "ffprobe exited with code {:?} for {}",
                output.status.code(),
                input_path.display()
            )));
        }

        let duration_str = String::from_utf8_lossy(&output.stdout);
        parse_duration(duration_str.trim())
    }

    /// Get width/height of the first video stream.
    pub fn video_geometry(&self, input_path: &Path) -> ProbeResult<VideoGeometry> {
        if !input_path.exists() {
            return Err(ProbeError::SourceNotFound(
                input_path.display().to_string(),
            ));
        }

        let output = Command::new(self.ffprobe_cmd())
            .arg("-v")
            .arg("error")
            .arg("-select_streams")
            .arg("v:0")
            .arg("-show_entries")
            .arg("stream=width,height")
            .arg("-of")
            .arg("csv=s=x:p=0")
            .arg(input_path)
            .output()
            .map_err(|e| ProbeError::FfprobeError(format!("Failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(ProbeError::FfprobeError(format!(
                "ffprobe exited with code {:?} for {}",
                output.status.code(),
                input_path.display()
            )));
        }

        let geometry_str = String::from_utf8_lossy(&output.stdout);
        parse_geometry(geometry_str.trim())
    }
}

/// Parse a duration value printed by ffprobe.
fn parse_duration(raw: &str) -> ProbeResult<f64> {
    let value = raw.parse::<f64>().map_err(|e| ProbeError::ParseError {
        what: "duration".to_string(),
        message: e.to_string(),
    })?;
    if !value.is_finite() || value < 0.0 {
        return Err(ProbeError::ParseError {
            what: "duration".to_string(),
            message: format!("invalid duration '{}'", raw),
        });
    }
    Ok(value)
}

/// Parse a `WIDTHxHEIGHT` line printed by ffprobe.
fn parse_geometry(raw: &str) -> ProbeResult<VideoGeometry> {
    let parse_err = |message: String| ProbeError::ParseError {
        what: "video geometry".to_string(),
        message,
    };

    let (w, h) = raw
        .split_once('x')
        .ok_or_else(|| parse_err(format!("expected WxH, got '{}'", raw)))?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|e| parse_err(e.to_string()))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|e| parse_err(e.to_string()))?;
    if width == 0 || height == 0 {
        return Err(parse_err(format!("zero dimension in '{}'", raw)));
    }
    Ok(VideoGeometry { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_duration() {
        assert!((parse_duration("12.345").unwrap() - 12.345).abs() < 1e-9);
    }

    #[test]
    fn rejects_bad_duration() {
        assert!(parse_duration("N/A").is_err());
        assert!(parse_duration("-3.0").is_err());
    }

    #[test]
    fn parses_geometry() {
        let geo = parse_geometry("1920x1080").unwrap();
        assert_eq!(geo.width, 1920);
        assert_eq!(geo.height, 1080);
    }

    #[test]
    fn rejects_bad_geometry() {
        assert!(parse_geometry("1920").is_err());
        assert!(parse_geometry("0x1080").is_err());
    }

    #[test]
    fn duration_rejects_missing_file() {
        let probe = MediaProbe::new();
        let result = probe.duration(Path::new("/nonexistent/clip.mp4"));
        assert!(matches!(result, Err(ProbeError::SourceNotFound(_))));
    }
}
