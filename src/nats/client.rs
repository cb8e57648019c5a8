use anyhow::{Context, Result};
use super::messages::AudioFrameMessage;
use async_nats::Client;
use tracing::{debug, info};

/// Subject prefix for outgoing audio frames
pub const AUDIO_SUBJECT_PREFIX: &str = "audio.frame";

/// Subjects the STT service publishes transcripts on (partial and final)
pub const TRANSCRIPT_SUBJECT: &str = "stt.text.>";

/// Shared NATS connection used for all recordings
pub struct NatsClient {
    client: Client,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client })
    }

    /// Subject carrying audio for one recording
    pub fn audio_subject(session_id: &str) -> String {
        format!("{}.recording-{}", AUDIO_SUBJECT_PREFIX, session_id)
    }

    /// Publish one audio frame for a recording
    pub async fn publish_audio_frame(
        &self,
        session_id: &str,
        pcm_bytes: &[u8],
        sample_rate: u32,
        channels: u16,
        sequence: u32,
        is_final: bool,
    ) -> Result<()> {
        let subject = Self::audio_subject(session_id);

        let message = AudioFrameMessage::new(
            session_id,
            pcm_bytes,
            sample_rate,
            channels,
            sequence,
            is_final,
        );

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish audio frame")?;

        debug!(
            "Published audio frame to {} (sequence={}, bytes={}, final={})",
            subject,
            sequence,
            pcm_bytes.len(),
            is_final
        );

        Ok(())
    }

    /// Flush buffered publishes to the server
    pub async fn flush(&self) -> Result<()> {
        self.client.flush().await.context("Failed to flush NATS")?;
        Ok(())
    }

    /// Subscribe to transcript messages
    ///
    /// The STT service publishes every session on the same subjects, so
    /// callers filter by `session_id` in the payload.
    pub async fn subscribe_transcripts(&self) -> Result<async_nats::Subscriber> {
        debug!("Subscribing to transcripts on {}", TRANSCRIPT_SUBJECT);

        let subscriber = self
            .client
            .subscribe(TRANSCRIPT_SUBJECT.to_string())
            .await
            .context("Failed to subscribe to transcripts")?;

        Ok(subscriber)
    }
}
