use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Base URL of the TTS engine inside the default container network.
pub const DEFAULT_TTS_URL: &str = "http://voicevox-engine:50021";

fn default_base_url() -> String {
    DEFAULT_TTS_URL.to_string()
}

/// Where to reach the TTS engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl TtsConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

/// Local playback settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// ALSA device passed to `aplay -D`, e.g. `plughw:1,0`. When unset,
    /// `aplay` uses the system default device.
    #[serde(default)]
    pub alsa_device: Option<String>,

    /// Directory for temporary waveform files. Defaults to the OS temp dir.
    #[serde(default)]
    pub artifact_dir: Option<PathBuf>,
}

impl PlaybackConfig {
    /// Resolved artifact directory.
    pub fn artifact_dir(&self) -> PathBuf {
        self.artifact_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}
