//! Cached audio synthesis keyed by content fingerprint.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::cache::{CacheError, CacheStore};
use crate::models::{AudioArtifact, VoiceParams};

use super::provider::{ProviderFailure, SpeechProvider};

/// Errors from audio synthesis.
#[derive(Error, Debug)]
pub enum SynthesisError {
    /// Narration text was empty after normalization.
    #[error("Narration text is empty")]
    EmptyText,

    /// The external provider failed. Not retried here; retry policy
    /// belongs to the caller.
    #[error(transparent)]
    Provider(#[from] ProviderFailure),

    /// Cache write failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Sidecar metadata could not be serialized.
    #[error("Failed to encode artifact metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Result type for synthesis operations.
pub type SynthesisResult<T> = Result<T, SynthesisError>;

/// Collapse whitespace runs and trim; case and punctuation are preserved
/// because they change the spoken output.
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Deterministic fingerprint over normalized text and voice parameters.
pub fn fingerprint(text: &str, voice: &VoiceParams) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(text).as_bytes());
    hasher.update(b"\n");
    hasher.update(voice.fingerprint_material().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Speech synthesizer backed by a content-addressable cache.
///
/// Layout under the injected store: `{fingerprint}/audio.{ext}` plus a
/// `{fingerprint}/meta.json` sidecar carrying duration, voice params and
/// creation time.
pub struct AudioSynthesizer {
    provider: Arc<dyn SpeechProvider>,
    store: Arc<dyn CacheStore>,
}

impl AudioSynthesizer {
    pub fn new(provider: Arc<dyn SpeechProvider>, store: Arc<dyn CacheStore>) -> Self {
        Self { provider, store }
    }

    /// Synthesize narration, serving repeats from cache.
    ///
    /// Concurrent calls that share a fingerprint serialize on the key
    /// lock: exactly one provider call executes, the rest block and read
    /// the artifact it produced. A sidecar whose audio file is missing or
    /// unreadable is treated as a miss and regenerated.
    pub fn synthesize(&self, text: &str, voice: &VoiceParams) -> SynthesisResult<AudioArtifact> {
        if normalize(text).is_empty() {
            return Err(SynthesisError::EmptyText);
        }

        let fp = fingerprint(text, voice);
        let meta_key = format!("{}/meta.json", fp);

        let lock = self.store.key_lock(&fp);
        let _guard = lock.lock();

        match self.load_cached(&fp, &meta_key) {
            Ok(Some(artifact)) => {
                tracing::debug!(fingerprint = %fp, "audio cache hit");
                return Ok(artifact);
            }
            Ok(None) => {}
            Err(reason) => {
                // Stale or torn entry: drop the sidecar and fall through
                // to regeneration.
                tracing::warn!(fingerprint = %fp, %reason, "corrupt audio cache entry, regenerating");
                self.store.remove(&meta_key)?;
            }
        }

        tracing::debug!(fingerprint = %fp, "audio cache miss, invoking provider");
        let speech = self.provider.synthesize(text, voice)?;

        let audio_key = format!("{}/audio.{}", fp, speech.extension);
        let file_path = self.store.put(&audio_key, &speech.audio)?;

        let artifact = AudioArtifact {
            fingerprint: fp,
            file_path,
            duration_seconds: speech.duration_seconds,
            voice: voice.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        let meta = serde_json::to_vec_pretty(&artifact)?;
        self.store.put(&meta_key, &meta)?;

        Ok(artifact)
    }

    /// Load a cached artifact, verifying the audio file is intact.
    ///
    /// `Ok(None)` = plain miss; `Err(reason)` = sidecar present but entry
    /// unusable (corruption, handled as a miss by the caller).
    fn load_cached(&self, fp: &str, meta_key: &str) -> Result<Option<AudioArtifact>, String> {
        let meta_path = match self.store.get(meta_key) {
            Some(p) => p,
            None => return Ok(None),
        };

        let raw = std::fs::read(&meta_path).map_err(|e| format!("unreadable sidecar: {}", e))?;
        let mut artifact: AudioArtifact =
            serde_json::from_slice(&raw).map_err(|e| format!("invalid sidecar: {}", e))?;

        // The sidecar records the audio file name; resolve through the
        // store so relocated cache roots keep working.
        let file_name = artifact
            .file_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| "sidecar has no audio file name".to_string())?;
        let audio_key = format!("{}/{}", fp, file_name);

        match self.store.get(&audio_key) {
            Some(path) => {
                artifact.file_path = path;
                Ok(Some(artifact))
            }
            None => Err("audio file missing".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FsCacheStore;
    use crate::audio::provider::SynthesizedSpeech;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    /// Provider fake that counts invocations.
    struct CountingProvider {
        calls: AtomicUsize,
        duration: f64,
    }

    impl CountingProvider {
        fn new(duration: f64) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                duration,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SpeechProvider for CountingProvider {
        fn synthesize(
            &self,
            text: &str,
            _voice: &VoiceParams,
        ) -> Result<SynthesizedSpeech, ProviderFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SynthesizedSpeech {
                audio: text.as_bytes().to_vec(),
                duration_seconds: self.duration,
                extension: "mp3".to_string(),
            })
        }
    }

    struct FailingProvider;

    impl SpeechProvider for FailingProvider {
        fn synthesize(
            &self,
            _text: &str,
            _voice: &VoiceParams,
        ) -> Result<SynthesizedSpeech, ProviderFailure> {
            Err(ProviderFailure::new("provider unavailable"))
        }
    }

    fn synthesizer_with(
        dir: &std::path::Path,
        provider: Arc<dyn SpeechProvider>,
    ) -> AudioSynthesizer {
        AudioSynthesizer::new(provider, Arc::new(FsCacheStore::new(dir)))
    }

    #[test]
    fn fingerprint_ignores_whitespace_runs_but_not_case() {
        let voice = VoiceParams::new("mark");
        assert_eq!(
            fingerprint("hello   world", &voice),
            fingerprint("hello world", &voice)
        );
        assert_ne!(
            fingerprint("HELLO world", &voice),
            fingerprint("hello world", &voice)
        );
    }

    #[test]
    fn fingerprint_depends_on_voice() {
        assert_ne!(
            fingerprint("hello", &VoiceParams::new("mark")),
            fingerprint("hello", &VoiceParams::new("rachel"))
        );
    }

    #[test]
    fn second_call_is_a_cache_hit() {
        let dir = tempdir().unwrap();
        let provider = Arc::new(CountingProvider::new(4.2));
        let synth = synthesizer_with(dir.path(), provider.clone());
        let voice = VoiceParams::new("mark");

        let first = synth.synthesize("hello world", &voice).unwrap();
        let second = synth.synthesize("hello world", &voice).unwrap();

        assert_eq!(provider.call_count(), 1);
        assert_eq!(first.fingerprint, second.fingerprint);
        assert!((second.duration_seconds - 4.2).abs() < 1e-9);
        assert!(second.file_path.exists());
    }

    #[test]
    fn empty_text_is_an_input_error() {
        let dir = tempdir().unwrap();
        let synth = synthesizer_with(dir.path(), Arc::new(CountingProvider::new(1.0)));

        let result = synth.synthesize("   \n  ", &VoiceParams::new("mark"));
        assert!(matches!(result, Err(SynthesisError::EmptyText)));
    }

    #[test]
    fn provider_failure_propagates_without_retry() {
        let dir = tempdir().unwrap();
        let synth = synthesizer_with(dir.path(), Arc::new(FailingProvider));

        let result = synth.synthesize("hello", &VoiceParams::new("mark"));
        assert!(matches!(result, Err(SynthesisError::Provider(_))));
    }

    #[test]
    fn missing_audio_file_regenerates_transparently() {
        let dir = tempdir().unwrap();
        let provider = Arc::new(CountingProvider::new(2.0));
        let synth = synthesizer_with(dir.path(), provider.clone());
        let voice = VoiceParams::new("mark");

        let artifact = synth.synthesize("hello", &voice).unwrap();
        // Corrupt the cache: sidecar stays, audio disappears.
        std::fs::remove_file(&artifact.file_path).unwrap();

        let regenerated = synth.synthesize("hello", &voice).unwrap();
        assert_eq!(provider.call_count(), 2);
        assert!(regenerated.file_path.exists());
    }

    #[test]
    fn concurrent_identical_requests_collapse_to_one_provider_call() {
        let dir = tempdir().unwrap();
        let provider = Arc::new(CountingProvider::new(3.0));
        let synth = Arc::new(synthesizer_with(dir.path(), provider.clone()));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let synth = Arc::clone(&synth);
            handles.push(std::thread::spawn(move || {
                synth
                    .synthesize("same text", &VoiceParams::new("mark"))
                    .unwrap()
            }));
        }

        let artifacts: Vec<AudioArtifact> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(provider.call_count(), 1);
        let fp = &artifacts[0].fingerprint;
        assert!(artifacts.iter().all(|a| &a.fingerprint == fp));
    }

    #[test]
    fn different_voices_do_not_share_entries() {
        let dir = tempdir().unwrap();
        let provider = Arc::new(CountingProvider::new(1.0));
        let synth = synthesizer_with(dir.path(), provider.clone());

        synth.synthesize("hello", &VoiceParams::new("mark")).unwrap();
        synth
            .synthesize("hello", &VoiceParams::new("rachel"))
            .unwrap();

        assert_eq!(provider.call_count(), 2);
    }

    #[test]
    fn works_against_the_in_memory_store() {
        let dir = tempdir().unwrap();
        let provider = Arc::new(CountingProvider::new(2.5));
        let synth = AudioSynthesizer::new(
            provider.clone(),
            Arc::new(crate::cache::MemoryCacheStore::new(dir.path())),
        );
        let voice = VoiceParams::new("mark");

        let first = synth.synthesize("store swap", &voice).unwrap();
        let second = synth.synthesize("store swap", &voice).unwrap();

        assert_eq!(provider.call_count(), 1);
        assert_eq!(first.fingerprint, second.fingerprint);
    }
}
