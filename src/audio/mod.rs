//! Speech synthesis with content-addressable caching.
//!
//! `AudioSynthesizer` fingerprints (normalized text + voice params) and
//! serves repeat requests from the cache with zero provider calls.
//! Concurrent requests for the same fingerprint serialize on a per-key
//! advisory lock so exactly one provider call runs per unique input.

mod provider;
mod synthesizer;

pub use provider::{CommandSpeechProvider, ProviderFailure, SpeechProvider, SynthesizedSpeech};
pub use synthesizer::{fingerprint, AudioSynthesizer, SynthesisError, SynthesisResult};
