use super::error::StorageError;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Blob flavours used by the recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobKind {
    /// Append-only blob holding the recording
    Append,
    /// Whole-object blob (transcripts)
    Block,
}

/// HTTP content headers stored alongside a blob
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSettings {
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    pub content_language: Option<String>,
}

/// Blob metadata as reported by the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobProperties {
    pub kind: BlobKind,

    /// Assigned by the store when the blob is first created
    pub creation_time: DateTime<Utc>,

    /// Bumped on every write (append or header change)
    pub last_modified: DateTime<Utc>,

    /// Current length in bytes
    pub content_length: u64,

    pub content_settings: ContentSettings,
}

/// Object store operations needed for recording sessions
///
/// Every failure to find a container or blob is reported as
/// `StorageError::NotFound`, regardless of backend.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Create a new container (fails if it already exists)
    async fn create_container(&self, container: &str) -> Result<(), StorageError>;

    /// Allow anonymous read access to the blobs in a container
    async fn set_container_public_access(&self, container: &str) -> Result<(), StorageError>;

    /// Create an empty append blob unless one already exists
    ///
    /// Returns `true` if the blob was created by this call.
    async fn create_append_blob_if_missing(
        &self,
        container: &str,
        blob: &str,
    ) -> Result<bool, StorageError>;

    /// Read blob metadata
    async fn blob_properties(&self, container: &str, blob: &str)
        -> Result<BlobProperties, StorageError>;

    /// Replace the content headers of a blob
    async fn set_content_settings(
        &self,
        container: &str,
        blob: &str,
        settings: &ContentSettings,
    ) -> Result<(), StorageError>;

    /// Append bytes at the current end of an append blob
    async fn append_block(&self, container: &str, blob: &str, data: Bytes)
        -> Result<(), StorageError>;

    /// Download the full blob contents
    async fn download_blob(&self, container: &str, blob: &str) -> Result<Bytes, StorageError>;

    /// Create or overwrite a block blob
    async fn upload_block_blob(
        &self,
        container: &str,
        blob: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Public URL of a blob (`<account_url>/<container>/<blob>`)
    fn blob_url(&self, container: &str, blob: &str) -> String;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Join an account URL with a container and blob name
pub(crate) fn join_blob_url(account_url: &str, container: &str, blob: &str) -> String {
    format!("{}/{}/{}", account_url.trim_end_matches('/'), container, blob)
}
