use super::blob::{join_blob_url, BlobKind, BlobProperties, BlobStore, ContentSettings};
use super::error::StorageError;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug)]
struct StoredBlob {
    properties: BlobProperties,
    data: Vec<u8>,
}

#[derive(Debug, Default)]
struct Container {
    public: bool,
    blobs: HashMap<String, StoredBlob>,
}

/// In-process blob store with the same semantics as the Azure backend
///
/// Nothing is persisted; contents live as long as the process.
#[derive(Debug)]
pub struct MemoryBlobStore {
    account_url: String,
    containers: RwLock<HashMap<String, Container>>,
}

impl MemoryBlobStore {
    pub fn new(account_url: impl Into<String>) -> Self {
        Self {
            account_url: account_url.into(),
            containers: RwLock::new(HashMap::new()),
        }
    }

    /// Whether a container allows anonymous blob reads
    pub async fn is_public(&self, container: &str) -> Option<bool> {
        let containers = self.containers.read().await;
        containers.get(container).map(|c| c.public)
    }

    /// Number of blobs in a container
    pub async fn blob_count(&self, container: &str) -> Option<usize> {
        let containers = self.containers.read().await;
        containers.get(container).map(|c| c.blobs.len())
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new("http://localhost/devstoreaccount")
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn create_container(&self, container: &str) -> Result<(), StorageError> {
        let mut containers = self.containers.write().await;
        if containers.contains_key(container) {
            return Err(StorageError::AlreadyExists(container.to_string()));
        }
        containers.insert(container.to_string(), Container::default());
        debug!("Created container {}", container);
        Ok(())
    }

    async fn set_container_public_access(&self, container: &str) -> Result<(), StorageError> {
        let mut containers = self.containers.write().await;
        let entry = containers
            .get_mut(container)
            .ok_or_else(|| StorageError::container_not_found(container))?;
        entry.public = true;
        Ok(())
    }

    async fn create_append_blob_if_missing(
        &self,
        container: &str,
        blob: &str,
    ) -> Result<bool, StorageError> {
        let mut containers = self.containers.write().await;
        let entry = containers
            .get_mut(container)
            .ok_or_else(|| StorageError::container_not_found(container))?;

        if entry.blobs.contains_key(blob) {
            return Ok(false);
        }

        let now = Utc::now();
        entry.blobs.insert(
            blob.to_string(),
            StoredBlob {
                properties: BlobProperties {
                    kind: BlobKind::Append,
                    creation_time: now,
                    last_modified: now,
                    content_length: 0,
                    content_settings: ContentSettings {
                        content_type: Some("application/octet-stream".to_string()),
                        ..ContentSettings::default()
                    },
                },
                data: Vec::new(),
            },
        );
        Ok(true)
    }

    async fn blob_properties(
        &self,
        container: &str,
        blob: &str,
    ) -> Result<BlobProperties, StorageError> {
        let containers = self.containers.read().await;
        let entry = containers
            .get(container)
            .ok_or_else(|| StorageError::container_not_found(container))?;
        let stored = entry
            .blobs
            .get(blob)
            .ok_or_else(|| StorageError::blob_not_found(blob))?;
        Ok(stored.properties.clone())
    }

    async fn set_content_settings(
        &self,
        container: &str,
        blob: &str,
        settings: &ContentSettings,
    ) -> Result<(), StorageError> {
        let mut containers = self.containers.write().await;
        let stored = containers
            .get_mut(container)
            .ok_or_else(|| StorageError::container_not_found(container))?
            .blobs
            .get_mut(blob)
            .ok_or_else(|| StorageError::blob_not_found(blob))?;

        stored.properties.content_settings = settings.clone();
        stored.properties.last_modified = Utc::now();
        Ok(())
    }

    async fn append_block(
        &self,
        container: &str,
        blob: &str,
        data: Bytes,
    ) -> Result<(), StorageError> {
        let mut containers = self.containers.write().await;
        let stored = containers
            .get_mut(container)
            .ok_or_else(|| StorageError::container_not_found(container))?
            .blobs
            .get_mut(blob)
            .ok_or_else(|| StorageError::blob_not_found(blob))?;

        if stored.properties.kind != BlobKind::Append {
            return Err(StorageError::Status {
                status: 409,
                code: "InvalidBlobType".to_string(),
                message: format!("blob '{}' is not an append blob", blob),
            });
        }

        stored.data.extend_from_slice(&data);
        stored.properties.content_length = stored.data.len() as u64;
        stored.properties.last_modified = Utc::now();
        Ok(())
    }

    async fn download_blob(&self, container: &str, blob: &str) -> Result<Bytes, StorageError> {
        let containers = self.containers.read().await;
        let stored = containers
            .get(container)
            .ok_or_else(|| StorageError::container_not_found(container))?
            .blobs
            .get(blob)
            .ok_or_else(|| StorageError::blob_not_found(blob))?;
        Ok(Bytes::copy_from_slice(&stored.data))
    }

    async fn upload_block_blob(
        &self,
        container: &str,
        blob: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let mut containers = self.containers.write().await;
        let entry = containers
            .get_mut(container)
            .ok_or_else(|| StorageError::container_not_found(container))?;

        let now = Utc::now();
        let creation_time = entry
            .blobs
            .get(blob)
            .map(|b| b.properties.creation_time)
            .unwrap_or(now);

        entry.blobs.insert(
            blob.to_string(),
            StoredBlob {
                properties: BlobProperties {
                    kind: BlobKind::Block,
                    creation_time,
                    last_modified: now,
                    content_length: data.len() as u64,
                    content_settings: ContentSettings {
                        content_type: Some(content_type.to_string()),
                        ..ContentSettings::default()
                    },
                },
                data: data.to_vec(),
            },
        );
        Ok(())
    }

    fn blob_url(&self, container: &str, blob: &str) -> String {
        join_blob_url(&self.account_url, container, blob)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
