use std::sync::Arc;

use azure_core::credentials::{Secret, TokenCredential};
use tracing::{debug, info};

use super::error::StorageError;
use crate::config::StorageConfig;

/// Build the Entra ID credential used when no SAS token is configured
///
/// A service principal is used when `tenant_id`, `client_id` and
/// `client_secret` are all set. Otherwise the Azure CLI login is used,
/// which suits local development.
pub fn build_credential(config: &StorageConfig) -> Result<Arc<dyn TokenCredential>, StorageError> {
    if let (Some(tenant_id), Some(client_id), Some(client_secret)) =
        (&config.tenant_id, &config.client_id, &config.client_secret)
    {
        info!("Using service-principal credentials for blob storage");
        debug!(tenant_id = %tenant_id, "building ClientSecretCredential");

        let credential = azure_identity::ClientSecretCredential::new(
            tenant_id,
            client_id.clone(),
            Secret::new(client_secret.clone()),
            None,
        )
        .map_err(|e| StorageError::Config(format!("credential error: {}", e)))?;

        Ok(credential)
    } else {
        info!("Using Azure CLI credentials for blob storage");
        let credential = azure_identity::AzureCliCredential::new(None)
            .map_err(|e| StorageError::Config(format!("credential error: {}", e)))?;

        Ok(credential)
    }
}
