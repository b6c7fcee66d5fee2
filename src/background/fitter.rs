//! Duration and aspect-ratio fitting for background clips.

use std::path::Path;

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::{BackgroundSpec, CropWindow, Resolution};
use crate::probe::{MediaProbe, ProbeError, VideoGeometry};

/// Errors from background fitting.
#[derive(Error, Debug)]
pub enum BackgroundError {
    /// Source was unreadable or corrupt. Picking an alternative source
    /// is the caller's responsibility.
    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error("Target duration must be a positive finite number, got {0}")]
    InvalidTarget(f64),

    #[error("Source clip has zero duration: {0}")]
    EmptySource(String),
}

/// Result type for background fitting.
pub type BackgroundResult<T> = Result<T, BackgroundError>;

/// Fits source clips to a target resolution and duration.
pub struct BackgroundFitter {
    probe: MediaProbe,
    target: Resolution,
}

impl BackgroundFitter {
    pub fn new(target: Resolution) -> Self {
        Self {
            probe: MediaProbe::new(),
            target,
        }
    }

    /// Use a custom probe (e.g. a non-PATH ffprobe binary).
    pub fn with_probe(mut self, probe: MediaProbe) -> Self {
        self.probe = probe;
        self
    }

    /// Fit `source` to `target_duration` seconds at the configured
    /// resolution.
    ///
    /// `seed` makes window selection reproducible per job: the same
    /// seed always picks the same window of a long source.
    pub fn fit(
        &self,
        source: &Path,
        target_duration: f64,
        seed: &str,
    ) -> BackgroundResult<BackgroundSpec> {
        if !target_duration.is_finite() || target_duration <= 0.0 {
            return Err(BackgroundError::InvalidTarget(target_duration));
        }

        let source_duration = self.probe.duration(source)?;
        if source_duration <= 0.0 {
            return Err(BackgroundError::EmptySource(source.display().to_string()));
        }
        let geometry = self.probe.video_geometry(source)?;

        Ok(plan_fit(
            source,
            source_duration,
            geometry,
            target_duration,
            self.target,
            seed,
        ))
    }
}

/// Pure fitting plan from already-probed source properties.
fn plan_fit(
    source: &Path,
    source_duration: f64,
    geometry: VideoGeometry,
    target_duration: f64,
    target: Resolution,
    seed: &str,
) -> BackgroundSpec {
    let (start_offset, loop_count) = if source_duration >= target_duration {
        (window_offset(seed, source_duration - target_duration), 1)
    } else {
        // Loop from the start until the concatenation covers the target;
        // the composer truncates to the exact duration.
        (0.0, (target_duration / source_duration).ceil() as u32)
    };

    BackgroundSpec {
        source_path: source.to_path_buf(),
        start_offset,
        loop_count,
        crop: cover_crop(geometry, target.aspect_ratio()),
        target,
        duration: target_duration,
    }
}

/// Deterministic window offset in `[0, slack]` derived from the seed.
fn window_offset(seed: &str, slack: f64) -> f64 {
    if slack <= 0.0 {
        return 0.0;
    }
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    let digest = hasher.finalize();
    let raw = u64::from_be_bytes(digest[..8].try_into().expect("digest is 32 bytes"));
    let fraction = raw as f64 / u64::MAX as f64;
    fraction * slack
}

/// Centered crop that scales-to-cover the target aspect ratio without
/// non-uniform distortion, in source pixel coordinates.
fn cover_crop(geometry: VideoGeometry, target_aspect: f64) -> CropWindow {
    let source_aspect = geometry.width as f64 / geometry.height as f64;

    if source_aspect > target_aspect {
        // Source too wide: crop width, keep full height.
        let crop_width = ((geometry.height as f64 * target_aspect).round() as u32)
            .clamp(1, geometry.width);
        CropWindow {
            x: (geometry.width - crop_width) / 2,
            y: 0,
            width: crop_width,
            height: geometry.height,
        }
    } else {
        // Source too tall (or equal): crop height, keep full width.
        let crop_height = ((geometry.width as f64 / target_aspect).round() as u32)
            .clamp(1, geometry.height);
        CropWindow {
            x: 0,
            y: (geometry.height - crop_height) / 2,
            width: geometry.width,
            height: crop_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const PORTRAIT: Resolution = Resolution {
        width: 1080,
        height: 1920,
    };

    fn plan(
        source_duration: f64,
        geometry: VideoGeometry,
        target_duration: f64,
        seed: &str,
    ) -> BackgroundSpec {
        plan_fit(
            &PathBuf::from("/bg/clip.mp4"),
            source_duration,
            geometry,
            target_duration,
            PORTRAIT,
            seed,
        )
    }

    #[test]
    fn short_source_loops_and_truncates() {
        // 10s source, 25s target: three loop iterations (30s raw)
        // truncated to exactly 25s.
        let spec = plan(
            10.0,
            VideoGeometry {
                width: 1920,
                height: 1080,
            },
            25.0,
            "job-1",
        );

        assert_eq!(spec.loop_count, 3);
        assert!((spec.start_offset - 0.0).abs() < 1e-9);
        assert!((spec.duration - 25.0).abs() < 1e-9);
    }

    #[test]
    fn long_source_selects_window_within_bounds() {
        let spec = plan(
            600.0,
            VideoGeometry {
                width: 1920,
                height: 1080,
            },
            30.0,
            "job-2",
        );

        assert_eq!(spec.loop_count, 1);
        assert!(spec.start_offset >= 0.0);
        assert!(spec.start_offset <= 570.0);
        assert!((spec.duration - 30.0).abs() < 1e-9);
    }

    #[test]
    fn window_selection_is_deterministic_per_seed() {
        let geometry = VideoGeometry {
            width: 1920,
            height: 1080,
        };
        let a = plan(600.0, geometry, 30.0, "job-a");
        let b = plan(600.0, geometry, 30.0, "job-a");
        let c = plan(600.0, geometry, 30.0, "job-b");

        assert_eq!(a.start_offset, b.start_offset);
        assert_ne!(a.start_offset, c.start_offset);
    }

    #[test]
    fn exact_length_source_plays_from_start() {
        let spec = plan(
            30.0,
            VideoGeometry {
                width: 1080,
                height: 1920,
            },
            30.0,
            "job-3",
        );
        assert_eq!(spec.loop_count, 1);
        assert!((spec.start_offset - 0.0).abs() < 1e-9);
    }

    #[test]
    fn wide_source_crops_width_centered() {
        let crop = cover_crop(
            VideoGeometry {
                width: 1920,
                height: 1080,
            },
            PORTRAIT.aspect_ratio(),
        );

        // 9:16 slice of a 1080-tall frame is ~608 wide.
        assert_eq!(crop.height, 1080);
        assert_eq!(crop.width, 608);
        assert_eq!(crop.x, (1920 - 608) / 2);
        assert_eq!(crop.y, 0);
    }

    #[test]
    fn tall_source_crops_height_centered() {
        // Taller than 9:16 (e.g. a 3:8 screen recording).
        let crop = cover_crop(
            VideoGeometry {
                width: 900,
                height: 2400,
            },
            PORTRAIT.aspect_ratio(),
        );

        assert_eq!(crop.width, 900);
        assert_eq!(crop.height, 1600);
        assert_eq!(crop.x, 0);
        assert_eq!(crop.y, (2400 - 1600) / 2);
    }

    #[test]
    fn matching_aspect_needs_no_crop() {
        let crop = cover_crop(
            VideoGeometry {
                width: 1080,
                height: 1920,
            },
            PORTRAIT.aspect_ratio(),
        );
        assert_eq!(crop.x, 0);
        assert_eq!(crop.y, 0);
        assert_eq!(crop.width, 1080);
        assert_eq!(crop.height, 1920);
    }

    #[test]
    fn invalid_target_duration_rejected() {
        let fitter = BackgroundFitter::new(PORTRAIT);
        let result = fitter.fit(Path::new("/bg/clip.mp4"), f64::INFINITY, "job");
        assert!(matches!(result, Err(BackgroundError::InvalidTarget(_))));
    }
}
