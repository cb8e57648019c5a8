// Integration tests for recording session operations
//
// Exercise `Recorder` directly against the in-memory store, plus a wrapper
// that injects storage failures.

use async_trait::async_trait;
use bytes::Bytes;
use live_recorder::storage::{BlobProperties, ContentSettings};
use live_recorder::{BlobStore, MemoryBlobStore, Recorder, RecordingError, StorageError};
use std::sync::Arc;

/// Memory store whose container ACL call always fails
struct PrivateOnlyStore {
    inner: MemoryBlobStore,
}

#[async_trait]
impl BlobStore for PrivateOnlyStore {
    async fn create_container(&self, container: &str) -> Result<(), StorageError> {
        self.inner.create_container(container).await
    }

    async fn set_container_public_access(&self, _container: &str) -> Result<(), StorageError> {
        Err(StorageError::Status {
            status: 409,
            code: "PublicAccessNotPermitted".to_string(),
            message: "Public access is not permitted on this storage account.".to_string(),
        })
    }

    async fn create_append_blob_if_missing(&self, container: &str, blob: &str) -> Result<bool, StorageError> {
        self.inner.create_append_blob_if_missing(container, blob).await
    }

    async fn blob_properties(&self, container: &str, blob: &str) -> Result<BlobProperties, StorageError> {
        self.inner.blob_properties(container, blob).await
    }

    async fn set_content_settings(
        &self,
        container: &str,
        blob: &str,
        settings: &ContentSettings,
    ) -> Result<(), StorageError> {
        self.inner.set_content_settings(container, blob, settings).await
    }

    async fn append_block(&self, container: &str, blob: &str, data: Bytes) -> Result<(), StorageError> {
        self.inner.append_block(container, blob, data).await
    }

    async fn download_blob(&self, container: &str, blob: &str) -> Result<Bytes, StorageError> {
        self.inner.download_blob(container, blob).await
    }

    async fn upload_block_blob(
        &self,
        container: &str,
        blob: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.inner.upload_block_blob(container, blob, data, content_type).await
    }

    fn blob_url(&self, container: &str, blob: &str) -> String {
        self.inner.blob_url(container, blob)
    }

    fn name(&self) -> &str {
        "private-only"
    }
}

fn recorder() -> (Recorder, Arc<MemoryBlobStore>) {
    let store = Arc::new(MemoryBlobStore::default());
    let dyn_store: Arc<dyn BlobStore> = store.clone();
    (Recorder::new(dyn_store, None), store)
}

#[tokio::test]
async fn test_start_session_ids_are_unique() {
    let (recorder, _) = recorder();
    let mut seen = std::collections::HashSet::new();

    for _ in 0..20 {
        let ids = recorder.start_session().await.unwrap();
        assert_eq!(uuid::Uuid::parse_str(&ids.folder_name).unwrap().get_version_num(), 4);
        assert_eq!(uuid::Uuid::parse_str(&ids.blob_name).unwrap().get_version_num(), 4);
        assert!(seen.insert(ids.folder_name));
        assert!(seen.insert(ids.blob_name));
    }
}

#[tokio::test]
async fn test_provisioning_failure_is_an_error() {
    let store: Arc<dyn BlobStore> = Arc::new(PrivateOnlyStore {
        inner: MemoryBlobStore::default(),
    });
    let recorder = Recorder::new(store, None);

    let err = recorder.start_session().await.unwrap_err();

    assert!(matches!(err, RecordingError::Provisioning { .. }));
    assert_eq!(err.status_code().as_u16(), 422);
    assert!(err.to_string().starts_with("FOLDER FAILED TO BE CREATED"));
}

#[tokio::test]
async fn test_append_sets_content_settings() {
    let (recorder, store) = recorder();
    let ids = recorder.start_session().await.unwrap();

    let appended = recorder
        .append_chunk(&ids.folder_name, &ids.blob_name, "AAAA", "video/mp4")
        .await
        .unwrap();
    assert_eq!(appended, 3);

    let props = store.blob_properties(&ids.folder_name, &ids.blob_name).await.unwrap();
    assert_eq!(props.content_length, 3);
    assert_eq!(props.content_settings.content_type.as_deref(), Some("video/mp4"));
    assert_eq!(props.content_settings.content_language.as_deref(), Some("en-US"));
}

#[tokio::test]
async fn test_append_carries_content_encoding_over() {
    let (recorder, store) = recorder();
    let ids = recorder.start_session().await.unwrap();
    recorder
        .append_chunk(&ids.folder_name, &ids.blob_name, "AAAA", "video/mp4")
        .await
        .unwrap();

    store
        .set_content_settings(
            &ids.folder_name,
            &ids.blob_name,
            &ContentSettings {
                content_type: Some("video/mp4".to_string()),
                content_encoding: Some("identity".to_string()),
                content_language: None,
            },
        )
        .await
        .unwrap();

    recorder
        .append_chunk(&ids.folder_name, &ids.blob_name, "AAAA", "video/webm")
        .await
        .unwrap();

    let props = store.blob_properties(&ids.folder_name, &ids.blob_name).await.unwrap();
    assert_eq!(props.content_settings.content_encoding.as_deref(), Some("identity"));
    assert_eq!(props.content_settings.content_type.as_deref(), Some("video/webm"));
    assert_eq!(props.content_settings.content_language.as_deref(), Some("en-US"));
}

#[tokio::test]
async fn test_empty_chunk_creates_blob_without_data() {
    let (recorder, store) = recorder();
    let ids = recorder.start_session().await.unwrap();

    let appended = recorder
        .append_chunk(&ids.folder_name, &ids.blob_name, "", "video/webm")
        .await
        .unwrap();
    assert_eq!(appended, 0);

    let props = store.blob_properties(&ids.folder_name, &ids.blob_name).await.unwrap();
    assert_eq!(props.content_length, 0);
    assert_eq!(props.content_settings.content_type.as_deref(), Some("video/webm"));
}

#[tokio::test]
async fn test_append_to_missing_container_reports_blob() {
    let (recorder, _) = recorder();

    let err = recorder
        .append_chunk("missing", "the-blob", "AAAA", "video/mp4")
        .await
        .unwrap_err();

    match err {
        RecordingError::NotFound { blob_name } => assert_eq!(blob_name, "the-blob"),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_finish_without_transcriber_has_no_transcript() {
    let (recorder, store) = recorder();
    let ids = recorder.start_session().await.unwrap();
    recorder
        .append_chunk(&ids.folder_name, &ids.blob_name, "AAAA", "video/mp4")
        .await
        .unwrap();

    let info = recorder.finish(&ids.folder_name, &ids.blob_name).await.unwrap();

    assert!(!recorder.transcription_enabled());
    assert!(info.transcript_url.is_none());
    assert_eq!(info.title, ids.blob_name);
    assert!(info.video_url.ends_with(&format!("/{}/{}", ids.folder_name, ids.blob_name)));
    assert!(info.creation_time <= info.modified_time);
    assert_eq!(store.blob_count(&ids.folder_name).await, Some(1));
}
