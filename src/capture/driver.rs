//! Capture driver abstraction and headless-browser implementation.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;

use crate::models::{CaptureTheme, OverlayStyle};

/// Opaque failure from the capture collaborator (navigation errors,
/// timeouts, missing elements).
#[derive(Error, Debug)]
#[error("Capture driver failed: {message}")]
pub struct DriverFailure {
    pub message: String,
}

impl DriverFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Viewport the capture renders with.
#[derive(Debug, Clone, Copy)]
pub struct ViewportOptions {
    pub width: u32,
    pub height: u32,
    /// Pixel density multiplier for crisp captures.
    pub device_scale: f64,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            device_scale: 2.0,
        }
    }
}

/// Images produced by one capture: the primary element plus any
/// secondary regions (e.g. top comments), primary first.
#[derive(Debug, Clone, Default)]
pub struct CaptureBatch {
    pub primary: Vec<u8>,
    pub secondary: Vec<Vec<u8>>,
}

/// External capture automation.
///
/// A driver navigates to the target, dismisses known interstitials, and
/// screenshots the relevant regions. `max_secondary` bounds how many
/// secondary images the driver should attempt.
pub trait CaptureDriver: Send + Sync {
    fn capture(
        &self,
        locator: &str,
        viewport: &ViewportOptions,
        style: &OverlayStyle,
        max_secondary: usize,
    ) -> Result<CaptureBatch, DriverFailure>;
}

/// Driver that shells out to a headless chromium binary.
///
/// The plain CLI can only produce the primary full-page screenshot;
/// secondary region captures need a scripted driver implementing
/// `CaptureDriver` on top of real browser automation.
pub struct ChromiumDriver {
    binary: PathBuf,
    scratch_dir: PathBuf,
    timeout_secs: u64,
}

impl ChromiumDriver {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        let scratch_dir =
            std::env::temp_dir().join(format!("storyreel-capture-{}", std::process::id()));
        Self {
            binary: binary.into(),
            scratch_dir,
            timeout_secs: 30,
        }
    }

    /// Use a custom scratch directory for screenshot files.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    /// Page-load timeout passed to the browser.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    fn theme_args(theme: CaptureTheme) -> Vec<String> {
        match theme {
            CaptureTheme::Dark => vec!["--force-dark-mode".to_string()],
            CaptureTheme::Light => Vec::new(),
            CaptureTheme::Transparent => vec![
                "--force-dark-mode".to_string(),
                "--default-background-color=00000000".to_string(),
            ],
        }
    }
}

impl CaptureDriver for ChromiumDriver {
    fn capture(
        &self,
        locator: &str,
        viewport: &ViewportOptions,
        style: &OverlayStyle,
        _max_secondary: usize,
    ) -> Result<CaptureBatch, DriverFailure> {
        fs::create_dir_all(&self.scratch_dir)
            .map_err(|e| DriverFailure::new(format!("creating scratch dir: {}", e)))?;

        let stamp = chrono::Local::now().format("%Y%m%d%H%M%S%f");
        let shot_path = self.scratch_dir.join(format!("shot-{}.png", stamp));

        let mut cmd = Command::new(&self.binary);
        cmd.arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--hide-scrollbars")
            .arg(format!("--window-size={},{}", viewport.width, viewport.height))
            .arg(format!("--force-device-scale-factor={}", viewport.device_scale))
            .arg(format!("--timeout={}", self.timeout_secs * 1000))
            .arg(format!("--screenshot={}", shot_path.display()));
        for arg in Self::theme_args(style.theme) {
            cmd.arg(arg);
        }
        cmd.arg(locator);

        tracing::debug!("Running capture: {:?}", cmd);

        let output = cmd
            .output()
            .map_err(|e| DriverFailure::new(format!("spawning browser: {}", e)))?;

        if !output.status.success() {
            let _ = fs::remove_file(&shot_path);
            return Err(DriverFailure::new(format!(
                "browser exited with code {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let primary = fs::read(&shot_path)
            .map_err(|e| DriverFailure::new(format!("reading screenshot: {}", e)))?;
        let _ = fs::remove_file(&shot_path);

        if primary.is_empty() {
            return Err(DriverFailure::new("browser produced an empty screenshot"));
        }

        Ok(CaptureBatch {
            primary,
            secondary: Vec::new(),
        })
    }
}
