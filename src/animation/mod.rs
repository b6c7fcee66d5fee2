//! Animation planning for overlay assets.
//!
//! Turns a set of captured overlay assets plus a display mode into
//! per-asset timing windows and entrance transitions. Aggregate
//! displayed time never exceeds the available duration: windows compress
//! proportionally instead of dropping assets.

mod compositor;

pub use compositor::{AnimationCompositor, PlanError, PlanResult};
