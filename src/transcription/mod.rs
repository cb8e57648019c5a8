//! Speech-to-text for finished recordings
//!
//! The finalizer hands extracted audio to a `Transcriber`. Two backends:
//! - `NatsTranscriber` - streams PCM frames to the STT service over NATS
//! - `WhisperTranscriber` - uploads a WAV to an OpenAI-compatible endpoint

mod nats;
mod whisper;

pub use self::nats::NatsTranscriber;
pub use self::whisper::WhisperTranscriber;

use crate::audio::PcmAudio;
use crate::config::{TranscriptionBackend, TranscriptionConfig};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Turns recorded speech into text
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe mono PCM at `sample_rate()`
    async fn transcribe(&self, session_id: &str, audio: &PcmAudio) -> Result<String>;

    /// Sample rate the backend expects
    fn sample_rate(&self) -> u32 {
        16000
    }

    /// Get backend name
    fn name(&self) -> &str;
}

/// Build the configured transcriber, or `None` when transcription is off
pub async fn create_transcriber(config: &TranscriptionConfig) -> Result<Option<Arc<dyn Transcriber>>> {
    if !config.enabled {
        info!("Transcription disabled");
        return Ok(None);
    }

    let transcriber: Arc<dyn Transcriber> = match config.backend {
        TranscriptionBackend::Nats => Arc::new(NatsTranscriber::connect(config).await?),
        TranscriptionBackend::Whisper => Arc::new(WhisperTranscriber::new(config)?),
    };

    info!("Transcription enabled ({})", transcriber.name());

    Ok(Some(transcriber))
}
