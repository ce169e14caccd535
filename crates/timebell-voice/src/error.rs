use std::fmt;
use thiserror::Error;

/// The TTS endpoint a request was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsStage {
    /// `POST /audio_query`
    Query,
    /// `POST /synthesis`
    Synthesis,
    /// `GET /speakers`
    Speakers,
}

impl TtsStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Query => "audio_query",
            Self::Synthesis => "synthesis",
            Self::Speakers => "speakers",
        }
    }
}

impl fmt::Display for TtsStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("no speaker configured")]
    NoSpeaker,

    #[error("TTS {stage} request failed: {source}")]
    TtsTransport {
        stage: TtsStage,
        #[source]
        source: reqwest::Error,
    },

    #[error("TTS {stage} returned status {status}: {body}")]
    TtsStatus {
        stage: TtsStage,
        status: u16,
        body: String,
    },

    #[error("failed to write audio artifact: {0}")]
    Artifact(#[from] std::io::Error),

    #[error("player {player} failed: {reason}")]
    PlayerFailed { player: String, reason: String },

    #[error("all playback backends failed: [{}]", .failures.join("; "))]
    Playback { failures: Vec<String> },
}

impl VoiceError {
    /// Returns `true` for errors raised by either TTS stage.
    pub fn is_tts(&self) -> bool {
        matches!(self, Self::TtsTransport { .. } | Self::TtsStatus { .. })
    }
}
