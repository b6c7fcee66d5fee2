//! Render queue types and persistence.

mod queue;
mod types;

pub use queue::RenderQueue;
pub use types::{RenderQueueEntry, RenderQueueStatus};
