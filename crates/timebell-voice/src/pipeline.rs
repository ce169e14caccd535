use crate::error::VoiceError;
use crate::playback::PlaybackEngine;
use crate::tts::TtsClient;
use timebell_types::PlayRequest;
use tokio::task::JoinHandle;

/// Fire-and-forget dispatch of announcements.
///
/// Implementations must return promptly; the announcement itself runs
/// elsewhere and its outcome is only logged.
pub trait Announcer: Send + Sync {
    fn dispatch(&self, request: PlayRequest);
}

/// Speaks an hour: TTS query, TTS synthesis, then local playback.
///
/// Each stage runs only if the previous one succeeded. Nothing is retried.
#[derive(Debug, Clone)]
pub struct AnnouncementPipeline {
    tts: TtsClient,
    playback: PlaybackEngine,
}

impl AnnouncementPipeline {
    pub fn new(tts: TtsClient, playback: PlaybackEngine) -> Self {
        Self { tts, playback }
    }

    /// Runs the pipeline to completion for `request`.
    pub async fn announce(&self, request: &PlayRequest) -> Result<(), VoiceError> {
        if request.speaker.trim().is_empty() {
            return Err(VoiceError::NoSpeaker);
        }

        let text = request.text();
        tracing::info!(hour = request.hour, speaker = %request.speaker, "announcing hour");

        let audio = self.tts.speak(&text, &request.speaker).await?;
        let player = self.playback.play(&audio).await?;

        tracing::info!(hour = request.hour, player = %player, "announcement complete");
        Ok(())
    }

    /// Runs the pipeline on a new task. Failures are logged by the task and
    /// also surfaced through the handle for callers that want them.
    pub fn spawn(&self, request: PlayRequest) -> JoinHandle<Result<(), VoiceError>> {
        let pipeline = self.clone();
        tokio::spawn(async move {
            let result = pipeline.announce(&request).await;
            if let Err(e) = &result {
                tracing::error!(
                    hour = request.hour,
                    speaker = %request.speaker,
                    error = %e,
                    "announcement failed"
                );
            }
            result
        })
    }
}

impl Announcer for AnnouncementPipeline {
    fn dispatch(&self, request: PlayRequest) {
        // Detached: the outcome is logged inside the task.
        drop(self.spawn(request));
    }
}
