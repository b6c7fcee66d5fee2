//! Configuration: settings schema and TOML-backed manager.

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    AudioSettings, CaptionSettings, CaptureSettings, ConfigSection, PathSettings, RenderSettings,
    Settings, VideoSettings,
};
