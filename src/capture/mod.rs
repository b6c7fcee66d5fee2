//! Overlay image capture with caching and retry/backoff.
//!
//! The real capture automation (navigate, dismiss interstitials,
//! screenshot regions) is an external collaborator behind the narrow
//! `CaptureDriver` trait. The service in front of it adds style-scoped
//! cache keys, a fixed three-attempt retry state machine with
//! exponential backoff, and atomic cache writes.

mod backoff;
mod driver;
mod service;

pub use backoff::{backoff_delay, AttemptState, Sleeper, ThreadSleeper, MAX_ATTEMPTS};
pub use driver::{CaptureBatch, CaptureDriver, ChromiumDriver, DriverFailure, ViewportOptions};
pub use service::{CaptureError, CaptureResult, OverlayCaptureService};
