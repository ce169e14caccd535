//! Process settings loading from file and environment variables.
//!
//! These are operator settings (where to listen, where the TTS engine lives,
//! how to play audio). The user-editable announcement schedule is a separate
//! JSON document owned by `timebell-store`.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use thiserror::Error;
use timebell_voice::{PlaybackConfig, TtsConfig};

/// Top-level process configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Announcement config storage.
    #[serde(default)]
    pub storage: StorageConfig,

    /// TTS engine location.
    #[serde(default)]
    pub tts: TtsConfig,

    /// Local playback settings.
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Static frontend settings.
    #[serde(default)]
    pub frontend: FrontendConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Where the announcement config JSON lives.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_config_path")]
    pub config_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrontendConfig {
    /// Directory containing `index.html`. Skipped if absent.
    #[serde(default = "default_frontend_dir")]
    pub dir: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "timebell_voice=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

fn default_config_path() -> PathBuf {
    PathBuf::from("config.json")
}

fn default_frontend_dir() -> PathBuf {
    PathBuf::from("frontend")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            config_path: default_config_path(),
        }
    }
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            dir: default_frontend_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `TIMEBELL_HOST` overrides `server.host`
/// - `TIMEBELL_PORT` overrides `server.port`
/// - `TIMEBELL_CONFIG_FILE_PATH` (or legacy `CONFIG_FILE_PATH`) overrides `storage.config_path`
/// - `TIMEBELL_TTS_URL` overrides `tts.base_url`
/// - `TIMEBELL_ALSA_DEVICE` overrides `playback.alsa_device`
/// - `TIMEBELL_ARTIFACT_DIR` overrides `playback.artifact_dir`
/// - `TIMEBELL_FRONTEND_DIR` overrides `frontend.dir`
/// - `TIMEBELL_LOG_LEVEL` overrides `logging.level`
/// - `TIMEBELL_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<AppConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Default settings file, looked up in the working directory.
pub const DEFAULT_SETTINGS_PATH: &str = "timebell.toml";

/// Picks the settings file from a command-line argument, then the
/// `TIMEBELL_SETTINGS_PATH` value, then [`DEFAULT_SETTINGS_PATH`]. Blank
/// values are skipped. Returns the path and where it came from.
pub fn settings_path(arg: Option<String>, env_value: Option<String>) -> (String, &'static str) {
    let non_blank = |value: String| (!value.trim().is_empty()).then_some(value);

    if let Some(path) = arg.and_then(non_blank) {
        return (path, "cli-arg");
    }
    match env_value.and_then(non_blank) {
        Some(path) => (path, "env-var"),
        None => (DEFAULT_SETTINGS_PATH.to_string(), "default"),
    }
}

/// Like [`load_config`], reading overrides through `env` instead of the
/// process environment.
pub fn load_config_with_env<F>(path: Option<&str>, env: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "settings file not found, using defaults");
                AppConfig::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => AppConfig::default(),
    };

    if let Some(parsed) = env("TIMEBELL_HOST").and_then(|v| v.parse().ok()) {
        config.server.host = parsed;
    }
    if let Some(parsed) = env("TIMEBELL_PORT").and_then(|v| v.parse().ok()) {
        config.server.port = parsed;
    }
    if let Some(path) = env("TIMEBELL_CONFIG_FILE_PATH").or_else(|| env("CONFIG_FILE_PATH")) {
        if !path.trim().is_empty() {
            config.storage.config_path = PathBuf::from(path);
        }
    }
    if let Some(url) = env("TIMEBELL_TTS_URL") {
        config.tts.base_url = url;
    }
    if let Some(device) = env("TIMEBELL_ALSA_DEVICE") {
        config.playback.alsa_device = Some(device).filter(|d| !d.trim().is_empty());
    }
    if let Some(dir) = env("TIMEBELL_ARTIFACT_DIR") {
        config.playback.artifact_dir = Some(PathBuf::from(dir));
    }
    if let Some(dir) = env("TIMEBELL_FRONTEND_DIR") {
        config.frontend.dir = PathBuf::from(dir);
    }
    if let Some(level) = env("TIMEBELL_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = env("TIMEBELL_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    Ok(config)
}
