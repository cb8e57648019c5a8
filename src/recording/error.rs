use crate::storage::StorageError;
use thiserror::Error;

/// Outcome of a failed recording operation
#[derive(Debug, Error)]
pub enum RecordingError {
    /// Session container or recording blob does not exist
    #[error("Blob '{blob_name}' not found")]
    NotFound { blob_name: String },

    /// Chunk payload is not valid base64
    #[error("Invalid chunk data: {0}")]
    InvalidChunk(#[from] base64::DecodeError),

    /// Request fields missing or malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Container could not be created or opened for public reads
    #[error("FOLDER FAILED TO BE CREATED: {source}")]
    Provisioning { source: StorageError },

    #[error("{0}")]
    Storage(StorageError),

    /// Audio track could not be extracted from the recording
    #[error("Failed to extract audio: {0:#}")]
    Media(anyhow::Error),

    #[error("Transcription failed: {0:#}")]
    Transcription(anyhow::Error),
}

impl RecordingError {
    /// Classify a storage failure for an operation on `blob_name`
    pub fn storage(blob_name: &str, err: StorageError) -> Self {
        if err.is_not_found() {
            Self::NotFound {
                blob_name: blob_name.to_string(),
            }
        } else {
            Self::Storage(err)
        }
    }
}
