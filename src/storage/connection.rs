use super::error::StorageError;

/// Parsed storage account connection string
///
/// Only the blob endpoint and an optional SAS token are used. Account-key
/// strings are rejected: the blob client authenticates with Entra ID tokens
/// or SAS, never Shared Key.
#[derive(Clone)]
pub struct ConnectionString {
    pub account_name: Option<String>,
    pub blob_endpoint: String,
    pub sas_token: Option<String>,
}

impl std::fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionString")
            .field("account_name", &self.account_name)
            .field("blob_endpoint", &self.blob_endpoint)
            .field("sas_token", &self.sas_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ConnectionString {
    /// Parse a `Key=Value;Key=Value` connection string
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let mut account_name = None;
        let mut has_account_key = false;
        let mut protocol = "https".to_string();
        let mut suffix = "core.windows.net".to_string();
        let mut blob_endpoint = None;
        let mut sas_token = None;

        for part in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                StorageError::Config(format!("malformed connection string segment '{}'", key_only(part)))
            })?;
            match key.to_ascii_lowercase().as_str() {
                "accountname" => account_name = Some(value.to_string()),
                "accountkey" => has_account_key = true,
                "defaultendpointsprotocol" => protocol = value.to_string(),
                "endpointsuffix" => suffix = value.to_string(),
                "blobendpoint" => blob_endpoint = Some(value.trim_end_matches('/').to_string()),
                "sharedaccesssignature" => {
                    sas_token = Some(value.trim_start_matches('?').to_string())
                }
                "usedevelopmentstorage" => {
                    return Err(StorageError::Config(
                        "UseDevelopmentStorage relies on Shared Key; give Azurite a BlobEndpoint and SharedAccessSignature instead"
                            .to_string(),
                    ))
                }
                _ => {}
            }
        }

        if has_account_key && sas_token.is_none() {
            return Err(StorageError::Config(
                "AccountKey connection strings are not supported; use a SharedAccessSignature or Entra ID credentials"
                    .to_string(),
            ));
        }

        let blob_endpoint = match (blob_endpoint, &account_name) {
            (Some(endpoint), _) => endpoint,
            (None, Some(account)) => format!("{}://{}.blob.{}", protocol, account, suffix),
            (None, None) => {
                return Err(StorageError::Config(
                    "connection string needs AccountName or BlobEndpoint".to_string(),
                ))
            }
        };

        Ok(Self {
            account_name,
            blob_endpoint,
            sas_token,
        })
    }
}

// Never echo values back, they may be secrets
fn key_only(segment: &str) -> &str {
    segment.split('=').next().unwrap_or_default()
}
