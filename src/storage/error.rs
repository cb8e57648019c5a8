use thiserror::Error;

/// Errors reported by a `BlobStore`
#[derive(Debug, Error)]
pub enum StorageError {
    /// Container or blob does not exist
    #[error("{resource} '{name}' not found")]
    NotFound { resource: &'static str, name: String },

    /// Container already exists
    #[error("container '{0}' already exists")]
    AlreadyExists(String),

    /// The service rejected the request
    #[error("storage request failed ({status}): {code}: {message}")]
    Status {
        status: u16,
        code: String,
        message: String,
    },

    /// Network, credential or protocol failure talking to the service
    #[error("storage transport error: {0}")]
    Transport(azure_core::Error),

    /// Bad connection string or credentials
    #[error("storage configuration error: {0}")]
    Config(String),
}

impl StorageError {
    pub fn container_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            resource: "container",
            name: name.into(),
        }
    }

    pub fn blob_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            resource: "blob",
            name: name.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
