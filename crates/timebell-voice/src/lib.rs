//! Voice output for Timebell.
//!
//! Turns an hour into sound in three steps: the TTS engine is asked for a
//! synthesis query, the query is synthesized into a waveform, and the
//! waveform is rendered through the first local audio player that works.
//!
//! The TTS engine is a VOICEVOX-compatible HTTP service reached through
//! [`TtsClient`]. Playback goes through a [`PlaybackEngine`] holding an
//! ordered list of [`Player`] backends. [`AnnouncementPipeline`] ties the
//! two together and implements [`Announcer`], the fire-and-forget seam used
//! by the scheduler and the HTTP layer.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod playback;
pub mod tts;

pub use config::{PlaybackConfig, TtsConfig, DEFAULT_TTS_URL};
pub use error::{TtsStage, VoiceError};
pub use pipeline::{AnnouncementPipeline, Announcer};
pub use playback::{default_players, CommandPlayer, PlaybackEngine, Player};
pub use tts::TtsClient;
