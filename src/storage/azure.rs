use std::sync::Arc;

use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use azure_core::error::ErrorKind;
use azure_core::http::headers::CONTENT_TYPE;
use azure_core::http::{RequestContent, StatusCode, XmlFormat};
use azure_core::time::OffsetDateTime;
use azure_storage_blob::models::{
    AppendBlobClientCreateOptions, BlobClientGetPropertiesResultHeaders,
    BlobClientSetPropertiesOptions, BlobContainerClientSetAccessPolicyOptions, BlobType,
    BlockBlobClientUploadOptions, PublicAccessType, SignedIdentifiers,
};
use azure_storage_blob::BlobServiceClient;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, error};

use super::blob::{join_blob_url, BlobKind, BlobProperties, BlobStore, ContentSettings};
use super::error::StorageError;

/// How requests to the account are authorised
pub enum BlobAuth {
    /// Shared access signature appended to every request URL
    Sas(String),
    /// Entra ID bearer tokens
    Token(Arc<dyn TokenCredential>),
}

/// Azure Blob Storage through the `azure_storage_blob` SDK
pub struct AzureBlobStore {
    service: BlobServiceClient,
    account_url: String,
}

impl std::fmt::Debug for AzureBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBlobStore")
            .field("account_url", &self.account_url)
            .finish_non_exhaustive()
    }
}

impl AzureBlobStore {
    /// Create a store for the account at `endpoint`
    ///
    /// `account_url` is the public base used for blob URLs; it defaults to
    /// the endpoint. Token auth requires an https endpoint.
    pub fn new(endpoint: &str, auth: BlobAuth, account_url: Option<String>) -> Result<Self, StorageError> {
        let endpoint = endpoint.trim_end_matches('/');

        let service = match auth {
            BlobAuth::Sas(token) => {
                let url = format!("{}?{}", endpoint, token.trim_start_matches('?'));
                BlobServiceClient::new(&url, None, None)
            }
            BlobAuth::Token(credential) => BlobServiceClient::new(endpoint, Some(credential), None),
        }
        .map_err(|e| StorageError::Config(format!("blob client error for '{}': {}", endpoint, e)))?;

        let account_url = account_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| endpoint.to_string());

        Ok(Self { service, account_url })
    }

    pub fn account_url(&self) -> &str {
        &self.account_url
    }
}

/// Status and error code of a failed service call, if it got that far
fn http_failure(err: &azure_core::Error) -> Option<(StatusCode, String)> {
    match err.kind() {
        ErrorKind::HttpResponse { status, error_code, .. } => {
            Some((*status, error_code.clone().unwrap_or_default()))
        }
        _ => None,
    }
}

/// Map an SDK error onto a `StorageError`
///
/// 404s name the container when the call had no blob or the service says
/// the container is missing; otherwise they name the blob.
fn classify(err: azure_core::Error, container: &str, blob: Option<&str>) -> StorageError {
    let Some((status, code)) = http_failure(&err) else {
        error!("Storage request failed: {}", err);
        return StorageError::Transport(err);
    };

    if status == StatusCode::NotFound {
        return match (code.as_str(), blob) {
            (_, None) | ("ContainerNotFound", _) => StorageError::container_not_found(container),
            (_, Some(blob)) => StorageError::blob_not_found(blob),
        };
    }

    if status == StatusCode::Conflict && code == "ContainerAlreadyExists" {
        return StorageError::AlreadyExists(container.to_string());
    }

    error!("Storage request failed ({}): {} {}", u16::from(status), code, err);

    StorageError::Status {
        status: status.into(),
        code,
        message: err.to_string(),
    }
}

fn to_utc(time: Option<OffsetDateTime>) -> Option<DateTime<Utc>> {
    time.and_then(|t| DateTime::from_timestamp(t.unix_timestamp(), t.nanosecond()))
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    async fn create_container(&self, container: &str) -> Result<(), StorageError> {
        debug!("Creating container {}", container);
        self.service
            .blob_container_client(container)
            .create(None)
            .await
            .map_err(|e| classify(e, container, None))?;
        Ok(())
    }

    async fn set_container_public_access(&self, container: &str) -> Result<(), StorageError> {
        let acl: RequestContent<SignedIdentifiers, XmlFormat> = SignedIdentifiers::default()
            .try_into()
            .map_err(StorageError::Transport)?;
        let options = BlobContainerClientSetAccessPolicyOptions {
            access: Some(PublicAccessType::Blob),
            ..Default::default()
        };

        self.service
            .blob_container_client(container)
            .set_access_policy(acl, Some(options))
            .await
            .map_err(|e| classify(e, container, None))?;
        Ok(())
    }

    async fn create_append_blob_if_missing(
        &self,
        container: &str,
        blob: &str,
    ) -> Result<bool, StorageError> {
        let options = AppendBlobClientCreateOptions::default().with_if_not_exists();
        let result = self
            .service
            .blob_client(container, blob)
            .append_blob_client()
            .create(Some(options))
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) => match http_failure(&e) {
                Some((StatusCode::Conflict, code)) if code == "BlobAlreadyExists" => Ok(false),
                _ => Err(classify(e, container, Some(blob))),
            },
        }
    }

    async fn blob_properties(
        &self,
        container: &str,
        blob: &str,
    ) -> Result<BlobProperties, StorageError> {
        let response = self
            .service
            .blob_client(container, blob)
            .get_properties(None)
            .await
            .map_err(|e| classify(e, container, Some(blob)))?;

        let last_modified = to_utc(response.last_modified().map_err(StorageError::Transport)?)
            .unwrap_or_else(Utc::now);
        let creation_time =
            to_utc(response.creation_time().map_err(StorageError::Transport)?).unwrap_or(last_modified);

        let kind = match response.blob_type().map_err(StorageError::Transport)? {
            Some(BlobType::AppendBlob) => BlobKind::Append,
            _ => BlobKind::Block,
        };

        Ok(BlobProperties {
            kind,
            creation_time,
            last_modified,
            content_length: response
                .content_length()
                .map_err(StorageError::Transport)?
                .unwrap_or(0),
            content_settings: ContentSettings {
                content_type: response
                    .headers()
                    .get_optional_string(&CONTENT_TYPE)
                    .filter(|v| !v.is_empty()),
                content_encoding: response
                    .content_encoding()
                    .map_err(StorageError::Transport)?
                    .filter(|v| !v.is_empty()),
                content_language: response
                    .content_language()
                    .map_err(StorageError::Transport)?
                    .filter(|v| !v.is_empty()),
            },
        })
    }

    async fn set_content_settings(
        &self,
        container: &str,
        blob: &str,
        settings: &ContentSettings,
    ) -> Result<(), StorageError> {
        let options = BlobClientSetPropertiesOptions {
            blob_content_type: settings.content_type.clone(),
            blob_content_encoding: settings.content_encoding.clone(),
            blob_content_language: settings.content_language.clone(),
            ..Default::default()
        };

        self.service
            .blob_client(container, blob)
            .set_properties(Some(options))
            .await
            .map_err(|e| classify(e, container, Some(blob)))?;
        Ok(())
    }

    async fn append_block(
        &self,
        container: &str,
        blob: &str,
        data: Bytes,
    ) -> Result<(), StorageError> {
        let length = data.len() as u64;
        debug!("Appending {} bytes to {}/{}", length, container, blob);

        self.service
            .blob_client(container, blob)
            .append_blob_client()
            .append_block(data.into(), length, None)
            .await
            .map_err(|e| classify(e, container, Some(blob)))?;
        Ok(())
    }

    async fn download_blob(&self, container: &str, blob: &str) -> Result<Bytes, StorageError> {
        let response = self
            .service
            .blob_client(container, blob)
            .download(None)
            .await
            .map_err(|e| classify(e, container, Some(blob)))?;

        response
            .into_body()
            .collect()
            .await
            .map_err(StorageError::Transport)
    }

    async fn upload_block_blob(
        &self,
        container: &str,
        blob: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let length = data.len() as u64;
        let options = BlockBlobClientUploadOptions {
            blob_content_type: Some(content_type.to_string()),
            ..Default::default()
        };

        self.service
            .blob_client(container, blob)
            .upload(data.into(), true, length, Some(options))
            .await
            .map_err(|e| classify(e, container, Some(blob)))?;
        Ok(())
    }

    fn blob_url(&self, container: &str, blob: &str) -> String {
        join_blob_url(&self.account_url, container, blob)
    }

    fn name(&self) -> &str {
        "azure"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_error(status: StatusCode, code: &str) -> azure_core::Error {
        azure_core::Error::with_message(
            ErrorKind::HttpResponse {
                status,
                error_code: Some(code.to_string()),
                raw_response: None,
            },
            format!("{}: The specified resource was rejected.", code),
        )
    }

    fn sas_store() -> AzureBlobStore {
        AzureBlobStore::new(
            "https://acct.blob.core.windows.net/",
            BlobAuth::Sas("?sv=2021-08-06&sig=abc".to_string()),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_sas_rides_on_blob_requests() {
        let store = sas_store();
        let url = store.service.blob_client("folder", "video").url().to_string();

        assert_eq!(url, "https://acct.blob.core.windows.net/folder/video?sv=2021-08-06&sig=abc");
    }

    #[test]
    fn test_blob_url_never_carries_sas() {
        let store = sas_store();
        assert_eq!(store.blob_url("f", "b"), "https://acct.blob.core.windows.net/f/b");

        let store = AzureBlobStore::new(
            "https://acct.blob.core.windows.net",
            BlobAuth::Sas("sig=abc".to_string()),
            Some("https://cdn.example.com/".to_string()),
        )
        .unwrap();
        assert_eq!(store.blob_url("f", "b"), "https://cdn.example.com/f/b");
    }

    #[test]
    fn test_emulator_endpoint_path_is_kept() {
        let store = AzureBlobStore::new(
            "http://127.0.0.1:10000/devstoreaccount1/",
            BlobAuth::Sas("sig=abc".to_string()),
            None,
        )
        .unwrap();

        let url = store.service.blob_client("f", "b").url().to_string();
        assert_eq!(url, "http://127.0.0.1:10000/devstoreaccount1/f/b?sig=abc");
    }

    #[test]
    fn test_token_auth_requires_https() {
        let credential = azure_identity::AzureCliCredential::new(None).unwrap();
        let result = AzureBlobStore::new("http://127.0.0.1:10000/acct", BlobAuth::Token(credential), None);

        assert!(matches!(result, Err(StorageError::Config(_))));
    }

    #[test]
    fn test_not_found_names_the_missing_resource() {
        let err = classify(http_error(StatusCode::NotFound, "ContainerNotFound"), "folder", Some("video"));
        assert_eq!(err.to_string(), "container 'folder' not found");

        let err = classify(http_error(StatusCode::NotFound, "BlobNotFound"), "folder", Some("video"));
        assert_eq!(err.to_string(), "blob 'video' not found");

        // HEAD responses carry no code
        let err = classify(http_error(StatusCode::NotFound, ""), "folder", None);
        assert_eq!(err.to_string(), "container 'folder' not found");
    }

    #[test]
    fn test_existing_container_is_already_exists() {
        let err = classify(http_error(StatusCode::Conflict, "ContainerAlreadyExists"), "folder", None);
        assert!(matches!(err, StorageError::AlreadyExists(name) if name == "folder"));
    }

    #[test]
    fn test_other_failures_keep_status_and_message() {
        let err = classify(
            http_error(StatusCode::Forbidden, "AuthorizationFailure"),
            "folder",
            Some("video"),
        );

        match err {
            StorageError::Status { status, code, message } => {
                assert_eq!(status, 403);
                assert_eq!(code, "AuthorizationFailure");
                assert!(message.contains("The specified resource was rejected"));
            }
            other => panic!("expected Status, got {:?}", other),
        }
    }

    #[test]
    fn test_non_http_failure_is_transport() {
        let err = classify(
            azure_core::Error::with_message(ErrorKind::Io, "connection reset"),
            "folder",
            None,
        );
        assert!(matches!(err, StorageError::Transport(_)));
    }
}
