//! Speech-synthesis provider abstraction.
//!
//! The real provider is an external collaborator; the crate talks to it
//! through the narrow `SpeechProvider` trait so tests substitute a fake.
//! `CommandSpeechProvider` drives a configured synthesis binary the same
//! way the rest of the crate drives ffmpeg.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;

use crate::models::VoiceParams;
use crate::probe::MediaProbe;

/// Opaque failure from the external synthesis collaborator.
#[derive(Error, Debug)]
#[error("Speech provider failed: {message}")]
pub struct ProviderFailure {
    pub message: String,
}

impl ProviderFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Audio produced by one synthesis call.
#[derive(Debug, Clone)]
pub struct SynthesizedSpeech {
    /// Encoded audio bytes.
    pub audio: Vec<u8>,
    /// Playback duration in seconds, as reported by the provider.
    pub duration_seconds: f64,
    /// Container extension without the dot ("mp3", "wav").
    pub extension: String,
}

/// External speech-synthesis collaborator.
pub trait SpeechProvider: Send + Sync {
    /// Synthesize narration with the given voice.
    fn synthesize(
        &self,
        text: &str,
        voice: &VoiceParams,
    ) -> Result<SynthesizedSpeech, ProviderFailure>;
}

/// Provider that shells out to a configured synthesis command.
///
/// The command is a program plus argument template; `{text_file}`,
/// `{output}` and `{voice}` placeholders are substituted per call. The
/// command must write the audio to `{output}`; duration is probed from
/// the produced file with ffprobe.
pub struct CommandSpeechProvider {
    command: Vec<String>,
    extension: String,
    scratch_dir: PathBuf,
    probe: MediaProbe,
}

impl CommandSpeechProvider {
    /// Create a provider from a command template and output extension.
    pub fn new(command: Vec<String>, extension: impl Into<String>) -> Self {
        let scratch_dir = std::env::temp_dir().join(format!("storyreel-synth-{}", std::process::id()));
        Self {
            command,
            extension: extension.into(),
            scratch_dir,
            probe: MediaProbe::new(),
        }
    }

    /// Use a custom scratch directory for intermediate files.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    fn substitute(template: &str, text_file: &str, output: &str, voice: &str) -> String {
        template
            .replace("{text_file}", text_file)
            .replace("{output}", output)
            .replace("{voice}", voice)
    }
}

impl SpeechProvider for CommandSpeechProvider {
    fn synthesize(
        &self,
        text: &str,
        voice: &VoiceParams,
    ) -> Result<SynthesizedSpeech, ProviderFailure> {
        if self.command.is_empty() {
            return Err(ProviderFailure::new("no synthesis command configured"));
        }

        fs::create_dir_all(&self.scratch_dir)
            .map_err(|e| ProviderFailure::new(format!("creating scratch dir: {}", e)))?;

        let stamp = chrono::Local::now().format("%Y%m%d%H%M%S%f");
        let text_path = self.scratch_dir.join(format!("narration-{}.txt", stamp));
        let audio_path = self
            .scratch_dir
            .join(format!("speech-{}.{}", stamp, self.extension));

        fs::write(&text_path, text)
            .map_err(|e| ProviderFailure::new(format!("writing narration file: {}", e)))?;

        let text_file = text_path.display().to_string();
        let output_file = audio_path.display().to_string();

        let program = Self::substitute(&self.command[0], &text_file, &output_file, &voice.voice_id);
        let args: Vec<String> = self.command[1..]
            .iter()
            .map(|a| Self::substitute(a, &text_file, &output_file, &voice.voice_id))
            .collect();

        tracing::debug!("Running synthesis command: {} {:?}", program, args);

        let output = Command::new(&program)
            .args(&args)
            .output()
            .map_err(|e| ProviderFailure::new(format!("spawning '{}': {}", program, e)))?;

        let _ = fs::remove_file(&text_path);

        if !output.status.success() {
            let _ = fs::remove_file(&audio_path);
            return Err(ProviderFailure::new(format!(
                "'{}' exited with code {:?}: {}",
                program,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let audio = fs::read(&audio_path)
            .map_err(|e| ProviderFailure::new(format!("reading synthesized audio: {}", e)))?;
        let duration_seconds = self
            .probe
            .duration(&audio_path)
            .map_err(|e| ProviderFailure::new(format!("probing synthesized audio: {}", e)))?;
        let _ = fs::remove_file(&audio_path);

        Ok(SynthesizedSpeech {
            audio,
            duration_seconds,
            extension: self.extension.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_all_placeholders() {
        let rendered = CommandSpeechProvider::substitute(
            "--voice={voice} --in={text_file} --out={output}",
            "/tmp/t.txt",
            "/tmp/o.mp3",
            "mark",
        );
        assert_eq!(rendered, "--voice=mark --in=/tmp/t.txt --out=/tmp/o.mp3");
    }

    #[test]
    fn empty_command_is_a_provider_failure() {
        let provider = CommandSpeechProvider::new(Vec::new(), "mp3");
        let result = provider.synthesize("hello", &VoiceParams::new("mark"));
        assert!(result.is_err());
    }
}
