use super::error::RecordingError;
use crate::audio;
use crate::storage::{BlobStore, ContentSettings};
use crate::transcription::Transcriber;
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Name of the transcript blob stored next to the recording
pub const TRANSCRIPT_BLOB_NAME: &str = "transcript.txt";

const TRANSCRIPT_CONTENT_TYPE: &str = "text/plain";

/// Content language stamped on every recording
const CONTENT_LANGUAGE: &str = "en-US";

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Identifiers handed to the client when a session starts
#[derive(Debug, Clone, Serialize)]
pub struct SessionIds {
    /// Container holding the session's blobs
    pub folder_name: String,

    /// Append blob receiving the chunks
    pub blob_name: String,
}

/// Metadata of a finished recording
#[derive(Debug, Clone, Serialize)]
pub struct RecordingInfo {
    pub video_url: String,
    pub creation_time: String,
    pub modified_time: String,
    pub content_type: String,
    pub title: String,
    pub transcript_url: Option<String>,
}

/// Session lifecycle over a blob store: start, append, finish
///
/// Holds the long-lived storage client and optional transcriber shared by
/// every request.
pub struct Recorder {
    store: Arc<dyn BlobStore>,
    transcriber: Option<Arc<dyn Transcriber>>,
}

fn format_time(time: DateTime<Utc>) -> String {
    time.format(TIME_FORMAT).to_string()
}

impl Recorder {
    pub fn new(store: Arc<dyn BlobStore>, transcriber: Option<Arc<dyn Transcriber>>) -> Self {
        Self { store, transcriber }
    }

    pub fn transcription_enabled(&self) -> bool {
        self.transcriber.is_some()
    }

    /// Allocate session identifiers and provision a publicly readable container
    pub async fn start_session(&self) -> Result<SessionIds, RecordingError> {
        let ids = SessionIds {
            folder_name: uuid::Uuid::new_v4().to_string(),
            blob_name: uuid::Uuid::new_v4().to_string(),
        };

        info!("Starting recording session: {}", ids.folder_name);

        self.store
            .create_container(&ids.folder_name)
            .await
            .map_err(|source| {
                error!("Failed to create container {}: {}", ids.folder_name, source);
                RecordingError::Provisioning { source }
            })?;

        // A failure here leaves a private container behind
        self.store
            .set_container_public_access(&ids.folder_name)
            .await
            .map_err(|source| {
                error!("Failed to open container {} for reads: {}", ids.folder_name, source);
                RecordingError::Provisioning { source }
            })?;

        info!(
            "Session {} ready, recording blob {}",
            ids.folder_name, ids.blob_name
        );

        Ok(ids)
    }

    /// Decode a base64 chunk and append it to the recording blob
    ///
    /// The blob is created on first use. Its content type is replaced by
    /// `content_type` on every call; a change of type is logged but accepted.
    /// Returns the number of bytes appended.
    pub async fn append_chunk(
        &self,
        folder_name: &str,
        blob_name: &str,
        data: &str,
        content_type: &str,
    ) -> Result<usize, RecordingError> {
        let payload = base64::engine::general_purpose::STANDARD.decode(data.trim())?;

        let created = self
            .store
            .create_append_blob_if_missing(folder_name, blob_name)
            .await
            .map_err(|e| RecordingError::storage(blob_name, e))?;
        if created {
            info!("Created recording blob {}/{}", folder_name, blob_name);
        }

        let properties = self
            .store
            .blob_properties(folder_name, blob_name)
            .await
            .map_err(|e| RecordingError::storage(blob_name, e))?;

        let previous = properties.content_settings.content_type.as_deref();
        if !created && previous.is_some_and(|p| !p.eq_ignore_ascii_case(content_type)) {
            warn!(
                "Content type of {} changed from {} to {}",
                blob_name,
                previous.unwrap_or_default(),
                content_type
            );
        }

        let settings = ContentSettings {
            content_type: Some(content_type.to_string()),
            content_encoding: properties.content_settings.content_encoding.clone(),
            content_language: Some(CONTENT_LANGUAGE.to_string()),
        };
        self.store
            .set_content_settings(folder_name, blob_name, &settings)
            .await
            .map_err(|e| RecordingError::storage(blob_name, e))?;

        let size = payload.len();
        if size == 0 {
            debug!("Empty chunk for {}, nothing to append", blob_name);
            return Ok(0);
        }

        self.store
            .append_block(folder_name, blob_name, Bytes::from(payload))
            .await
            .map_err(|e| RecordingError::storage(blob_name, e))?;

        debug!(
            "Appended {} bytes to {}/{} ({})",
            size, folder_name, blob_name, content_type
        );

        Ok(size)
    }

    /// Read recording metadata, transcribing it first when enabled
    pub async fn finish(
        &self,
        folder_name: &str,
        blob_name: &str,
    ) -> Result<RecordingInfo, RecordingError> {
        info!("Finishing recording {}/{}", folder_name, blob_name);

        let properties = self
            .store
            .blob_properties(folder_name, blob_name)
            .await
            .map_err(|e| RecordingError::storage(blob_name, e))?;

        let content_type = properties
            .content_settings
            .content_type
            .clone()
            .unwrap_or_default();

        let transcript_url = match &self.transcriber {
            Some(transcriber) => Some(
                self.transcribe(transcriber.as_ref(), folder_name, blob_name, &content_type)
                    .await?,
            ),
            None => None,
        };

        Ok(RecordingInfo {
            video_url: self.store.blob_url(folder_name, blob_name),
            creation_time: format_time(properties.creation_time),
            modified_time: format_time(properties.last_modified),
            content_type,
            title: blob_name.to_string(),
            transcript_url,
        })
    }

    /// Download the recording, transcribe its audio and store the text
    ///
    /// Returns the public URL of the transcript blob.
    async fn transcribe(
        &self,
        transcriber: &dyn Transcriber,
        folder_name: &str,
        blob_name: &str,
        content_type: &str,
    ) -> Result<String, RecordingError> {
        let video = self
            .store
            .download_blob(folder_name, blob_name)
            .await
            .map_err(|e| RecordingError::storage(blob_name, e))?;

        info!(
            "Extracting audio from {} ({} bytes, {})",
            blob_name,
            video.len(),
            content_type
        );

        let hint = (!content_type.is_empty()).then(|| content_type.to_string());
        let target_rate = transcriber.sample_rate();
        let audio = tokio::task::spawn_blocking(move || {
            audio::extract_audio(video.to_vec(), hint.as_deref())
                .and_then(|audio| audio.prepare_for_stt(target_rate))
        })
        .await
        .map_err(|e| RecordingError::Media(anyhow::anyhow!("Audio extraction task failed: {}", e)))?
        .map_err(RecordingError::Media)?;

        let text = if audio.is_empty() {
            warn!("Recording {} has an empty audio track", blob_name);
            String::new()
        } else {
            transcriber
                .transcribe(blob_name, &audio)
                .await
                .map_err(RecordingError::Transcription)?
        };

        info!(
            "Transcribed {} with {}: {} characters",
            blob_name,
            transcriber.name(),
            text.len()
        );

        self.store
            .upload_block_blob(
                folder_name,
                TRANSCRIPT_BLOB_NAME,
                Bytes::from(text),
                TRANSCRIPT_CONTENT_TYPE,
            )
            .await
            .map_err(|e| RecordingError::storage(blob_name, e))?;

        Ok(self.store.blob_url(folder_name, TRANSCRIPT_BLOB_NAME))
    }
}
