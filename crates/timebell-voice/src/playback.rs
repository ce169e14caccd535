//! Local audio playback through external player programs.
//!
//! Backends are tried in declared order. A backend whose program cannot be
//! found is skipped without counting as a failure; the first backend that
//! exits successfully ends the attempt.

use crate::config::PlaybackConfig;
use crate::error::VoiceError;
use async_trait::async_trait;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tempfile::TempPath;
use tokio::process::Command;

/// A way of rendering a waveform file to an output device.
#[async_trait]
pub trait Player: Send + Sync + fmt::Debug {
    /// Short name used in logs and error reports.
    fn name(&self) -> &str;

    /// Whether this backend can run on this host.
    fn is_available(&self) -> bool;

    /// Plays the file at `path` to completion.
    async fn invoke(&self, path: &Path) -> Result<(), VoiceError>;
}

/// A player backed by an executable on `PATH`.
///
/// Invoked as `<program> <args...> <path>`; success is a zero exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandPlayer {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl Player for CommandPlayer {
    fn name(&self) -> &str {
        &self.program
    }

    fn is_available(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    async fn invoke(&self, path: &Path) -> Result<(), VoiceError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| VoiceError::PlayerFailed {
                player: self.program.clone(),
                reason: format!("failed to spawn: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::PlayerFailed {
                player: self.program.clone(),
                reason: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        Ok(())
    }
}

/// The standard backend list: ALSA, PulseAudio, FFmpeg's player, then mpv.
pub fn default_players(alsa_device: Option<&str>) -> Vec<Arc<dyn Player>> {
    let aplay = match alsa_device {
        Some(device) => CommandPlayer::new("aplay", ["-D", device]),
        None => CommandPlayer::new("aplay", Vec::<String>::new()),
    };

    vec![
        Arc::new(aplay),
        Arc::new(CommandPlayer::new("paplay", Vec::<String>::new())),
        Arc::new(CommandPlayer::new(
            "ffplay",
            ["-nodisp", "-autoexit", "-loglevel", "quiet"],
        )),
        Arc::new(CommandPlayer::new("mpv", ["--no-video", "--really-quiet"])),
    ]
}

/// Renders waveform bytes through the first working backend.
///
/// There is no global playback lock: concurrent calls each get their own
/// artifact file.
#[derive(Debug, Clone)]
pub struct PlaybackEngine {
    players: Arc<[Arc<dyn Player>]>,
    artifact_dir: PathBuf,
}

impl PlaybackEngine {
    pub fn new(players: Vec<Arc<dyn Player>>, artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            players: players.into(),
            artifact_dir: artifact_dir.into(),
        }
    }

    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self::new(
            default_players(config.alsa_device.as_deref()),
            config.artifact_dir(),
        )
    }

    pub fn players(&self) -> &[Arc<dyn Player>] {
        &self.players
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    /// Plays `audio`, returning the name of the backend that succeeded.
    ///
    /// The artifact file is removed before returning, whatever the outcome.
    /// A failed removal is logged and does not change the result.
    pub async fn play(&self, audio: &[u8]) -> Result<String, VoiceError> {
        let artifact = self.write_artifact(audio).await?;
        let result = self.play_file(&artifact).await;

        let path = artifact.to_path_buf();
        match artifact.close() {
            Ok(()) => tracing::debug!(path = %path.display(), "removed audio artifact"),
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to remove audio artifact"
            ),
        }

        result
    }

    async fn write_artifact(&self, audio: &[u8]) -> Result<TempPath, VoiceError> {
        let dir = self.artifact_dir.clone();
        let audio = audio.to_vec();
        let path = tokio::task::spawn_blocking(move || -> std::io::Result<TempPath> {
            std::fs::create_dir_all(&dir)?;
            let mut file = tempfile::Builder::new()
                .prefix("timebell-")
                .suffix(".wav")
                .tempfile_in(&dir)?;
            file.write_all(&audio)?;
            file.flush()?;
            // Closing the handle leaves only the path; it is still removed on drop.
            Ok(file.into_temp_path())
        })
        .await
        .map_err(std::io::Error::other)??;
        Ok(path)
    }

    async fn play_file(&self, path: &Path) -> Result<String, VoiceError> {
        let mut failures = Vec::new();

        for player in self.players.iter() {
            // PATH lookup touches the filesystem.
            let probe = Arc::clone(player);
            let available = tokio::task::spawn_blocking(move || probe.is_available())
                .await
                .unwrap_or(false);
            if !available {
                tracing::debug!(player = player.name(), "playback backend not found, skipping");
                continue;
            }

            match player.invoke(path).await {
                Ok(()) => {
                    tracing::info!(player = player.name(), "played announcement audio");
                    return Ok(player.name().to_string());
                }
                Err(e) => {
                    tracing::warn!(player = player.name(), error = %e, "playback backend failed");
                    failures.push(e.to_string());
                }
            }
        }

        Err(VoiceError::Playback { failures })
    }
}
