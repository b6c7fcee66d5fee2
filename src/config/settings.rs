//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level
//! updates.

use serde::{Deserialize, Serialize};

use crate::capture::ViewportOptions;
use crate::compose::CaptionStyle;
use crate::models::Resolution;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Speech synthesis settings.
    #[serde(default)]
    pub audio: AudioSettings,

    /// Caption rendering settings.
    #[serde(default)]
    pub captions: CaptionSettings,

    /// Output video settings.
    #[serde(default)]
    pub video: VideoSettings,

    /// Overlay capture settings.
    #[serde(default)]
    pub capture: CaptureSettings,

    /// Render scheduling settings.
    #[serde(default)]
    pub render: RenderSettings,
}

impl Settings {
    /// Output frame resolution.
    pub fn resolution(&self) -> Resolution {
        Resolution {
            width: self.video.width,
            height: self.video.height,
        }
    }

    /// Caption style for the composer.
    pub fn caption_style(&self) -> CaptionStyle {
        CaptionStyle {
            font_file: self.captions.font_file.clone(),
            font_size: self.captions.font_size,
            text_color: self.captions.text_color.clone(),
            emphasis_color: self.captions.emphasis_color.clone(),
            outline_width: self.captions.outline_width,
            bottom_margin_px: self.captions.bottom_margin_px,
            uppercase: self.captions.uppercase,
        }
    }

    /// Capture viewport for the driver.
    pub fn viewport(&self) -> ViewportOptions {
        ViewportOptions {
            width: self.capture.viewport_width,
            height: self.capture.viewport_height,
            device_scale: self.capture.device_scale,
        }
    }
}

/// Path configuration for output, caches, temp, and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Output folder for finished videos.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Root folder for the audio and overlay caches.
    #[serde(default = "default_cache_root")]
    pub cache_root: String,

    /// Root folder for per-job working files.
    #[serde(default = "default_temp_root")]
    pub temp_root: String,

    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_output_folder() -> String {
    "renders".to_string()
}

fn default_cache_root() -> String {
    ".cache".to_string()
}

fn default_temp_root() -> String {
    ".temp".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            cache_root: default_cache_root(),
            temp_root: default_temp_root(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Speech synthesis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Synthesis command template; `{text_file}`, `{output}` and
    /// `{voice}` placeholders are substituted per call.
    #[serde(default)]
    pub synth_command: Vec<String>,

    /// Audio container extension the command produces.
    #[serde(default = "default_audio_format")]
    pub audio_format: String,
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            synth_command: Vec::new(),
            audio_format: default_audio_format(),
        }
    }
}

/// Caption rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionSettings {
    /// Words per caption chunk (3-5 reads best on vertical video).
    #[serde(default = "default_words_per_chunk")]
    pub words_per_chunk: usize,

    /// Font file for drawtext; empty lets ffmpeg pick.
    #[serde(default)]
    pub font_file: Option<String>,

    #[serde(default = "default_font_size")]
    pub font_size: u32,

    #[serde(default = "default_text_color")]
    pub text_color: String,

    /// Color for chunks carrying an emphasis token.
    #[serde(default = "default_emphasis_color")]
    pub emphasis_color: String,

    /// Outline thickness in pixels.
    #[serde(default = "default_outline_width")]
    pub outline_width: u32,

    /// Fixed pixel margin between captions and the bottom edge.
    #[serde(default = "default_bottom_margin")]
    pub bottom_margin_px: u32,

    /// Render caption text uppercase.
    #[serde(default = "default_true")]
    pub uppercase: bool,
}

fn default_words_per_chunk() -> usize {
    4
}

fn default_font_size() -> u32 {
    80
}

fn default_text_color() -> String {
    "yellow".to_string()
}

fn default_emphasis_color() -> String {
    "orange".to_string()
}

fn default_outline_width() -> u32 {
    5
}

fn default_bottom_margin() -> u32 {
    400
}

fn default_true() -> bool {
    true
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            words_per_chunk: default_words_per_chunk(),
            font_file: None,
            font_size: default_font_size(),
            text_color: default_text_color(),
            emphasis_color: default_emphasis_color(),
            outline_width: default_outline_width(),
            bottom_margin_px: default_bottom_margin(),
            uppercase: true,
        }
    }
}

/// Output video configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSettings {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_fps")]
    pub fps: u32,

    #[serde(default = "default_preset")]
    pub encoder_preset: String,

    #[serde(default = "default_crf")]
    pub crf: u32,
}

fn default_width() -> u32 {
    1080
}

fn default_height() -> u32 {
    1920
}

fn default_fps() -> u32 {
    30
}

fn default_preset() -> String {
    "medium".to_string()
}

fn default_crf() -> u32 {
    21
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            encoder_preset: default_preset(),
            crf: default_crf(),
        }
    }
}

/// Overlay capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Headless browser binary for the bundled driver.
    #[serde(default = "default_browser_binary")]
    pub browser_binary: String,

    #[serde(default = "default_width")]
    pub viewport_width: u32,

    #[serde(default = "default_height")]
    pub viewport_height: u32,

    /// Pixel density multiplier for crisp captures.
    #[serde(default = "default_device_scale")]
    pub device_scale: f64,

    /// Page-load timeout in seconds.
    #[serde(default = "default_capture_timeout")]
    pub timeout_secs: u64,
}

fn default_browser_binary() -> String {
    "chromium".to_string()
}

fn default_device_scale() -> f64 {
    2.0
}

fn default_capture_timeout() -> u64 {
    30
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            browser_binary: default_browser_binary(),
            viewport_width: default_width(),
            viewport_height: default_height(),
            device_scale: default_device_scale(),
            timeout_secs: default_capture_timeout(),
        }
    }
}

/// Render scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Bounded worker count for parallel queue processing.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    2
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

/// Identifies one settings section for atomic section updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Audio,
    Captions,
    Video,
    Capture,
    Render,
}

impl ConfigSection {
    /// TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Audio => "audio",
            ConfigSection::Captions => "captions",
            ConfigSection::Video => "video",
            ConfigSection::Capture => "capture",
            ConfigSection::Render => "render",
        }
    }

    /// All sections, in file order.
    pub fn all() -> [ConfigSection; 6] {
        [
            ConfigSection::Paths,
            ConfigSection::Audio,
            ConfigSection::Captions,
            ConfigSection::Video,
            ConfigSection::Capture,
            ConfigSection::Render,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_vertical_video() {
        let settings = Settings::default();
        assert_eq!(settings.video.width, 1080);
        assert_eq!(settings.video.height, 1920);
        assert_eq!(settings.video.fps, 30);
        assert!((settings.resolution().aspect_ratio() - 0.5625).abs() < 1e-9);
    }

    #[test]
    fn settings_round_trip_through_toml() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.captions.words_per_chunk, 4);
        assert_eq!(parsed.render.workers, 2);
    }

    #[test]
    fn missing_sections_take_defaults() {
        let parsed: Settings = toml::from_str("[video]\nfps = 60\n").unwrap();
        assert_eq!(parsed.video.fps, 60);
        assert_eq!(parsed.video.width, 1080);
        assert_eq!(parsed.captions.bottom_margin_px, 400);
    }

    #[test]
    fn section_table_names_match() {
        for section in ConfigSection::all() {
            assert!(!section.table_name().is_empty());
        }
    }
}
