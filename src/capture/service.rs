//! Overlay capture service: cache in front of the driver, retries behind.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::cache::{CacheError, CacheStore};
use crate::models::{CaptureTarget, OverlayAsset, OverlayStyle};

use super::backoff::{backoff_delay, AttemptState, Sleeper, ThreadSleeper};
use super::driver::{CaptureBatch, CaptureDriver, ViewportOptions};

/// Errors from overlay capture.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// All attempts failed. Callers must treat this as recoverable and
    /// fall back to a caption-only render.
    #[error("Capture exhausted after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    /// Cache write failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Slot name of the primary captured image.
const PRIMARY_SLOT: &str = "post";

/// Captures overlay images through an external driver, caching results
/// per content id and style.
///
/// Cache layout under the injected store:
/// `{content_id}/{style_hash}/post.png` plus `comment_{n}.png` for
/// secondary images. The style hash covers every option that changes
/// rendered pixels, so a cached asset is never served for a different
/// style.
pub struct OverlayCaptureService {
    driver: Arc<dyn CaptureDriver>,
    store: Arc<dyn CacheStore>,
    viewport: ViewportOptions,
    sleeper: Box<dyn Sleeper>,
}

impl OverlayCaptureService {
    pub fn new(driver: Arc<dyn CaptureDriver>, store: Arc<dyn CacheStore>) -> Self {
        Self {
            driver,
            store,
            viewport: ViewportOptions::default(),
            sleeper: Box::new(ThreadSleeper),
        }
    }

    /// Use a custom capture viewport.
    pub fn with_viewport(mut self, viewport: ViewportOptions) -> Self {
        self.viewport = viewport;
        self
    }

    /// Substitute the sleep implementation (tests).
    pub fn with_sleeper(mut self, sleeper: Box<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Capture the target's primary image and up to `max_secondary`
    /// secondary images, serving a fully-cached set without any external
    /// call.
    pub fn capture(&self, target: &CaptureTarget) -> CaptureResult<Vec<OverlayAsset>> {
        let style_hash = style_hash(&target.style);
        let prefix = format!("{}/{}", target.content_id, style_hash);

        let lock = self.store.key_lock(&prefix);
        let _guard = lock.lock();

        if let Some(assets) = self.cached_assets(target, &prefix) {
            tracing::debug!(content_id = %target.content_id, "overlay cache hit");
            return Ok(assets);
        }

        tracing::debug!(content_id = %target.content_id, "overlay cache miss, driving capture");
        let batch = self.capture_with_retries(target)?;
        self.persist_batch(target, &prefix, batch)
    }

    /// Return the cached asset set if the primary image is present.
    /// Secondary slots are collected until the first gap.
    fn cached_assets(&self, target: &CaptureTarget, prefix: &str) -> Option<Vec<OverlayAsset>> {
        let primary_path = self.store.get(&format!("{}/{}.png", prefix, PRIMARY_SLOT))?;

        let mut assets = vec![OverlayAsset {
            content_id: target.content_id.clone(),
            slot: PRIMARY_SLOT.to_string(),
            image_path: primary_path,
            style: target.style.clone(),
            from_cache: true,
        }];

        for n in 1..=target.max_secondary {
            let slot = format!("comment_{}", n);
            match self.store.get(&format!("{}/{}.png", prefix, slot)) {
                Some(path) => assets.push(OverlayAsset {
                    content_id: target.content_id.clone(),
                    slot,
                    image_path: path,
                    style: target.style.clone(),
                    from_cache: true,
                }),
                None => break,
            }
        }

        Some(assets)
    }

    /// Drive the capture collaborator through the retry state machine.
    fn capture_with_retries(&self, target: &CaptureTarget) -> CaptureResult<CaptureBatch> {
        let mut state = AttemptState::Attempt1;
        let mut last_error = String::new();

        while let Some(attempt) = state.number() {
            match self.driver.capture(
                &target.locator,
                &self.viewport,
                &target.style,
                target.max_secondary,
            ) {
                Ok(batch) => return Ok(batch),
                Err(e) => {
                    last_error = e.message;
                    state = state.after_failure();
                    if state != AttemptState::Exhausted {
                        let delay = backoff_delay(attempt);
                        tracing::warn!(
                            attempt,
                            delay_secs = delay.as_secs(),
                            error = %last_error,
                            "capture attempt failed, backing off"
                        );
                        self.sleeper.sleep(delay);
                    }
                }
            }
        }

        Err(CaptureError::Exhausted {
            attempts: super::backoff::MAX_ATTEMPTS,
            last_error,
        })
    }

    /// Write a captured batch into the cache and build the asset list.
    fn persist_batch(
        &self,
        target: &CaptureTarget,
        prefix: &str,
        batch: CaptureBatch,
    ) -> CaptureResult<Vec<OverlayAsset>> {
        let mut assets = Vec::with_capacity(1 + batch.secondary.len());

        let primary_path = self
            .store
            .put(&format!("{}/{}.png", prefix, PRIMARY_SLOT), &batch.primary)?;
        assets.push(OverlayAsset {
            content_id: target.content_id.clone(),
            slot: PRIMARY_SLOT.to_string(),
            image_path: primary_path,
            style: target.style.clone(),
            from_cache: false,
        });

        for (index, bytes) in batch
            .secondary
            .iter()
            .take(target.max_secondary)
            .enumerate()
        {
            let slot = format!("comment_{}", index + 1);
            let path = self.store.put(&format!("{}/{}.png", prefix, slot), bytes)?;
            assets.push(OverlayAsset {
                content_id: target.content_id.clone(),
                slot,
                image_path: path,
                style: target.style.clone(),
                from_cache: false,
            });
        }

        Ok(assets)
    }
}

/// Short hash of the style options folded into cache keys.
fn style_hash(style: &OverlayStyle) -> String {
    let mut hasher = Sha256::new();
    hasher.update(style.cache_material().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}
