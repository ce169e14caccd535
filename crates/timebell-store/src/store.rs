//! The shared configuration store.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tempfile::NamedTempFile;
use thiserror::Error;
use timebell_types::{Config, ValidationError};
use tokio::sync::Mutex;

/// Errors that can occur when loading or saving the configuration.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The configuration file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not a valid config document.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The new configuration violates the hour range.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// Encoding the configuration failed.
    #[error("failed to encode config: {0}")]
    Encode(#[from] serde_json::Error),

    /// Durable write of the configuration failed. The in-memory value was
    /// left untouched.
    #[error("failed to persist config to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The blocking persistence task panicked or was cancelled.
    #[error("persistence task failed: {0}")]
    Task(String),
}

/// Thread-safe owner of the current [`Config`].
///
/// Cheap to clone; clones share the same state.
///
/// Uses `std::sync::RwLock` for the value itself: every acquisition is a
/// clone or a pointer-sized swap that never spans an `.await`. Writers are
/// serialized by an async mutex held across the disk write, which readers
/// never touch.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    current: Arc<RwLock<Config>>,
    write_gate: Arc<Mutex<()>>,
    path: PathBuf,
}

impl ConfigStore {
    /// Opens the store backed by `path`.
    ///
    /// A missing file yields an empty configuration; nothing is written
    /// until the first [`set`](Self::set).
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the file exists but cannot be read, parsed, or
    /// contains out-of-range hours.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let config = match std::fs::read(&path) {
            Ok(bytes) => {
                let config: Config =
                    serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
                        path: path.clone(),
                        source,
                    })?;
                config.validate()?;
                tracing::info!(
                    path = %path.display(),
                    hours = ?config.times,
                    speaker = %config.speaker,
                    "loaded announcement config"
                );
                config
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "config file not found, starting empty");
                Config::default()
            }
            Err(source) => return Err(StoreError::Read { path, source }),
        };

        Ok(Self::with_config(path, config))
    }

    /// Creates a store holding an empty configuration without touching disk.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self::with_config(path.into(), Config::default())
    }

    fn with_config(path: PathBuf, config: Config) -> Self {
        Self {
            current: Arc::new(RwLock::new(config)),
            write_gate: Arc::new(Mutex::new(())),
            path,
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a snapshot of the current configuration.
    pub fn get(&self) -> Config {
        // The value is only ever replaced whole, so a poisoned lock still
        // guards a consistent config.
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Validates, persists and then installs `config`.
    ///
    /// Concurrent calls are serialized; the last one to acquire the gate
    /// wins. On error the previous configuration stays in effect both in
    /// memory and on disk.
    ///
    /// Once the write has started it runs to completion on a blocking task
    /// that also installs the value and releases the gate, so dropping the
    /// returned future cannot leave memory behind disk.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Invalid` for out-of-range hours and
    /// `StoreError::Persist` if the file could not be replaced.
    pub async fn set(&self, config: Config) -> Result<(), StoreError> {
        config.validate()?;
        let mut encoded = serde_json::to_vec_pretty(&config)?;
        encoded.push(b'\n');

        let gate = self.write_gate.clone().lock_owned().await;

        let path = self.path.clone();
        let current = self.current.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let _gate = gate;
            write_atomically(&path, &encoded)?;
            *current.write().unwrap_or_else(|e| e.into_inner()) = config;
            tracing::info!(path = %path.display(), "saved announcement config");
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

/// Writes `bytes` to a sibling temporary file and renames it over `path`.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let persist_err = |source: std::io::Error| StoreError::Persist {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(persist_err)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(persist_err)?;
    tmp.write_all(bytes).map_err(persist_err)?;
    tmp.as_file().sync_all().map_err(persist_err)?;
    tmp.persist(path).map_err(|e| persist_err(e.error))?;

    Ok(())
}
