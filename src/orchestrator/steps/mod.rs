//! Pipeline step implementations.

mod animate;
mod background;
mod capture;
mod captions;
mod compose;
mod synthesize;

pub use animate::AnimateStep;
pub use background::BackgroundStep;
pub use capture::CaptureStep;
pub use captions::CaptionsStep;
pub use compose::ComposeStep;
pub use synthesize::SynthesizeStep;
