//! storyreel - short-form video rendering pipeline.
//!
//! This crate contains all business logic with zero UI dependencies.
//! It turns narration text into a finished vertical video: synthesized
//! speech with content-addressed caching, time-synchronized captions, a
//! background clip fitted to the target duration, captured overlay images,
//! and a final ffmpeg mux driven by a step pipeline.

pub mod animation;
pub mod audio;
pub mod background;
pub mod cache;
pub mod captions;
pub mod capture;
pub mod compose;
pub mod config;
pub mod jobs;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod probe;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
