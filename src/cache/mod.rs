//! Shared content-addressable cache used by the audio and capture stages.
//!
//! The store is an injected abstraction rather than a module-level
//! singleton so tests can substitute an in-memory fake. Keys are
//! slash-separated paths (`{fingerprint}/audio.mp3`,
//! `{content_id}/{style_hash}/post.png`); directory naming stays out of
//! the business logic.

mod store;

pub use store::{CacheError, CacheResult, CacheStore, FsCacheStore, KeyLock, MemoryCacheStore};
