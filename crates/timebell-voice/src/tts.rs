use crate::config::TtsConfig;
use crate::error::{TtsStage, VoiceError};
use reqwest::{Client, Response, StatusCode};

/// Error bodies longer than this are truncated before logging.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Client for a VOICEVOX-compatible TTS engine.
///
/// Synthesis is a two-stage exchange: `audio_query` turns text into an opaque
/// query document, and `synthesis` renders that document into a WAV file.
/// No timeout is set beyond the transport default.
#[derive(Debug, Clone)]
pub struct TtsClient {
    http: Client,
    base_url: String,
}

impl TtsClient {
    pub fn new(config: &TtsConfig) -> Self {
        Self::with_client(Client::new(), &config.base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query stage. Returns the engine's query document verbatim.
    pub async fn audio_query(&self, text: &str, speaker: &str) -> Result<Vec<u8>, VoiceError> {
        let stage = TtsStage::Query;
        let response = self
            .http
            .post(format!("{}/audio_query", self.base_url))
            .query(&[("text", text), ("speaker", speaker)])
            .send()
            .await
            .map_err(|source| VoiceError::TtsTransport { stage, source })?;

        read_body(stage, response).await
    }

    /// Synthesis stage. Returns the raw waveform bytes.
    pub async fn synthesis(&self, query: &[u8], speaker: &str) -> Result<Vec<u8>, VoiceError> {
        let stage = TtsStage::Synthesis;
        let response = self
            .http
            .post(format!("{}/synthesis", self.base_url))
            .query(&[("speaker", speaker)])
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(query.to_vec())
            .send()
            .await
            .map_err(|source| VoiceError::TtsTransport { stage, source })?;

        read_body(stage, response).await
    }

    /// Runs both stages for `text`. The synthesis stage is skipped if the
    /// query stage fails.
    pub async fn speak(&self, text: &str, speaker: &str) -> Result<Vec<u8>, VoiceError> {
        let query = self.audio_query(text, speaker).await?;
        tracing::debug!(speaker, bytes = query.len(), "received audio query");
        let audio = self.synthesis(&query, speaker).await?;
        tracing::debug!(speaker, bytes = audio.len(), "received synthesized audio");
        Ok(audio)
    }

    /// Fetches the engine's speaker catalogue as raw JSON.
    pub async fn speakers(&self) -> Result<Vec<u8>, VoiceError> {
        let stage = TtsStage::Speakers;
        let response = self
            .http
            .get(format!("{}/speakers", self.base_url))
            .send()
            .await
            .map_err(|source| VoiceError::TtsTransport { stage, source })?;

        read_body(stage, response).await
    }
}

async fn read_body(stage: TtsStage, response: Response) -> Result<Vec<u8>, VoiceError> {
    let status = response.status();
    if status != StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        return Err(VoiceError::TtsStatus {
            stage,
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|source| VoiceError::TtsTransport { stage, source })?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = TtsClient::new(&TtsConfig::new("http://localhost:50021/"));
        assert_eq!(client.base_url(), "http://localhost:50021");
    }

    #[test]
    fn default_config_targets_engine_container() {
        let client = TtsClient::new(&TtsConfig::default());
        assert_eq!(client.base_url(), "http://voicevox-engine:50021");
    }
}
