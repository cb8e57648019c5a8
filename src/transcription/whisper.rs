use super::Transcriber;
use crate::audio::PcmAudio;
use crate::config::TranscriptionConfig;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

/// Transcriber for OpenAI-compatible `/audio/transcriptions` endpoints
pub struct WhisperTranscriber {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    sample_rate: u32,
}

#[derive(Deserialize)]
struct WhisperResponse {
    text: String,
}

impl WhisperTranscriber {
    pub fn new(config: &TranscriptionConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.whisper_url.trim_end_matches('/').to_string(),
            model: config.whisper_model.clone(),
            api_key: config.whisper_api_key.clone(),
            sample_rate: config.sample_rate,
        })
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, session_id: &str, audio: &PcmAudio) -> Result<String> {
        let url = format!("{}/audio/transcriptions", self.base_url);
        let wav = audio.to_wav()?;

        debug!(
            "Whisper transcription request: {} bytes, model={}",
            wav.len(),
            self.model
        );

        let file = Part::bytes(wav)
            .file_name(format!("{}.wav", session_id))
            .mime_str("audio/wav")?;
        let form = Form::new().part("file", file).text("model", self.model.clone());

        let mut request = self.client.post(&url).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .context("Failed to send request to transcription service")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Transcription service error ({}): {}", status, body);
            bail!("Transcription service returned {}: {}", status, body);
        }

        let result: WhisperResponse = response
            .json()
            .await
            .context("Failed to parse transcription response")?;

        Ok(result.text.trim().to_string())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn name(&self) -> &str {
        "whisper"
    }
}
