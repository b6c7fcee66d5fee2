//! Background clip fitting.
//!
//! Fits a source clip to an exact target duration and aspect ratio:
//! long sources contribute a deterministically-selected contiguous
//! window with a centered scale-to-cover crop; short sources loop from
//! the start and are truncated at compose time.

mod fitter;

pub use fitter::{BackgroundError, BackgroundFitter, BackgroundResult};
