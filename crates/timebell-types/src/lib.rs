//! Shared types for the Timebell workspace.
//!
//! This crate holds the value types that cross crate boundaries: the
//! announcement [`Config`] that users edit, the transient [`PlayRequest`]
//! built for a manual trigger, and the [`ValidationError`] raised when either
//! carries an hour outside the clock face.
//!
//! No crate in the workspace depends on anything *except* `timebell-types`
//! for shared definitions, which keeps the dependency graph acyclic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest valid trigger hour (inclusive).
pub const MAX_HOUR: u8 = 23;

/// Builds the sentence spoken for `hour`.
pub fn announcement_text(hour: u8) -> String {
    format!("{}時をお知らせします", hour)
}

/// Errors raised when a value violates the hour range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A trigger hour in a [`Config`] is out of range.
    #[error("trigger hour out of range: {0} (expected 0-{max})", max = MAX_HOUR)]
    TriggerHour(u8),

    /// The hour of a [`PlayRequest`] is out of range.
    #[error("hour out of range: {0} (expected 0-{max})", max = MAX_HOUR)]
    Hour(u8),
}

/// The user-editable announcement configuration.
///
/// Replaced wholesale on every save; never partially mutated. Duplicate
/// hours are allowed and carry no extra meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Hours (0-23) at which the current hour is announced.
    #[serde(default)]
    pub times: Vec<u8>,
    /// TTS voice identifier.
    #[serde(default)]
    pub speaker: String,
}

impl Config {
    pub fn new(times: impl Into<Vec<u8>>, speaker: impl Into<String>) -> Self {
        Self {
            times: times.into(),
            speaker: speaker.into(),
        }
    }

    /// Checks that every trigger hour is within 0-23.
    ///
    /// # Errors
    ///
    /// Returns the first offending hour as [`ValidationError::TriggerHour`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.times.iter().find(|&&hour| hour > MAX_HOUR) {
            Some(&hour) => Err(ValidationError::TriggerHour(hour)),
            None => Ok(()),
        }
    }

    /// Returns `true` if `hour` is one of the configured trigger hours.
    pub fn triggers_at(&self, hour: u8) -> bool {
        self.times.contains(&hour)
    }
}

/// A manual announcement request. Consumed once by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayRequest {
    pub speaker: String,
    pub hour: u8,
}

impl PlayRequest {
    pub fn new(speaker: impl Into<String>, hour: u8) -> Self {
        Self {
            speaker: speaker.into(),
            hour,
        }
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::Hour`] if the hour is out of range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.hour > MAX_HOUR {
            return Err(ValidationError::Hour(self.hour));
        }
        Ok(())
    }

    /// The sentence this request will speak.
    pub fn text(&self) -> String {
        announcement_text(self.hour)
    }
}
