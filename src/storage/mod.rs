//! Object storage for recordings
//!
//! Sessions map onto containers and recordings onto append blobs. The
//! `BlobStore` trait is the only seam the HTTP layer talks to:
//! - `AzureBlobStore` - Azure Blob Storage SDK (SAS or Entra ID auth)
//! - `MemoryBlobStore` - in-process store for local development and tests

mod auth;
mod azure;
mod blob;
mod connection;
mod error;
mod memory;

pub use auth::build_credential;
pub use azure::{AzureBlobStore, BlobAuth};
pub use blob::{BlobKind, BlobProperties, BlobStore, ContentSettings};
pub use connection::ConnectionString;
pub use error::StorageError;
pub use memory::MemoryBlobStore;

use crate::config::{StorageBackend, StorageConfig};
use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::info;

/// Build the long-lived blob store selected by configuration
pub fn create_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>> {
    match config.backend {
        StorageBackend::Azure => {
            let connection = config
                .connection_string
                .as_deref()
                .map(ConnectionString::parse)
                .transpose()?;

            let endpoint = match (&connection, &config.account_url) {
                (Some(conn), _) => conn.blob_endpoint.clone(),
                (None, Some(url)) => url.trim_end_matches('/').to_string(),
                (None, None) => bail!(
                    "storage.connection_string (CONNECTION_STRING) or storage.account_url (ACCOUNT_URL) is required for the azure backend"
                ),
            };

            let sas = connection
                .and_then(|conn| conn.sas_token)
                .or_else(|| config.sas_token.clone());
            let auth = match sas {
                Some(token) => BlobAuth::Sas(token),
                None => BlobAuth::Token(build_credential(config)?),
            };

            let store = AzureBlobStore::new(&endpoint, auth, config.account_url.clone())?;
            info!("Using Azure blob store at {}", store.account_url());
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            let account_url = config
                .account_url
                .clone()
                .unwrap_or_else(|| "http://localhost/devstoreaccount".to_string());
            info!("Using in-memory blob store ({})", account_url);
            Ok(Arc::new(MemoryBlobStore::new(account_url)))
        }
    }
}
