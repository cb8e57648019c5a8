use anyhow::{Context, Result};
use serde::Deserialize;

/// Prefix for `LIVE_RECORDER__SECTION__KEY` environment overrides
const ENV_PREFIX: &str = "LIVE_RECORDER";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub transcription: TranscriptionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Azure,
    Memory,
}

#[derive(Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Storage account connection string (`CONNECTION_STRING`)
    pub connection_string: Option<String>,
    /// Public base URL for blob links (`ACCOUNT_URL`); also the endpoint
    /// when no connection string is given
    pub account_url: Option<String>,
    /// SAS token used when the connection string carries none (`SAS_TOKEN`)
    pub sas_token: Option<String>,
    /// Entra ID service principal; Azure CLI login is used when incomplete
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("backend", &self.backend)
            .field(
                "connection_string",
                &self.connection_string.as_ref().map(|_| "[REDACTED]"),
            )
            .field("account_url", &self.account_url)
            .field("sas_token", &self.sas_token.as_ref().map(|_| "[REDACTED]"))
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionBackend {
    Nats,
    Whisper,
}

#[derive(Clone, Deserialize)]
pub struct TranscriptionConfig {
    pub enabled: bool,
    pub backend: TranscriptionBackend,
    /// Sample rate sent to the speech model
    pub sample_rate: u32,
    pub nats_url: String,
    /// Quiet period after the last audio frame before the transcript is considered complete
    pub idle_timeout_secs: u64,
    pub max_wait_secs: u64,
    pub whisper_url: String,
    pub whisper_model: String,
    pub whisper_api_key: Option<String>,
}

impl std::fmt::Debug for TranscriptionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscriptionConfig")
            .field("enabled", &self.enabled)
            .field("backend", &self.backend)
            .field("sample_rate", &self.sample_rate)
            .field("nats_url", &self.nats_url)
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .field("max_wait_secs", &self.max_wait_secs)
            .field("whisper_url", &self.whisper_url)
            .field("whisper_model", &self.whisper_model)
            .field(
                "whisper_api_key",
                &self.whisper_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment
    ///
    /// `CONNECTION_STRING`, `ACCOUNT_URL` and `SAS_TOKEN` are honoured last so existing
    /// deployments keep working without a config file.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "live-recorder")?
            .set_default("service.http.bind", "0.0.0.0")?
            .set_default("service.http.port", 8000)?
            .set_default("storage.backend", "azure")?
            .set_default("transcription.enabled", false)?
            .set_default("transcription.backend", "nats")?
            .set_default("transcription.sample_rate", 16000)?
            .set_default("transcription.nats_url", "nats://localhost:4222")?
            .set_default("transcription.idle_timeout_secs", 10)?
            .set_default("transcription.max_wait_secs", 300)?
            .set_default("transcription.whisper_url", "http://localhost:8080/v1")?
            .set_default("transcription.whisper_model", "base")?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        let mut cfg: Config = settings
            .try_deserialize()
            .context("Invalid configuration")?;

        if let Ok(conn) = std::env::var("CONNECTION_STRING") {
            cfg.storage.connection_string = Some(conn);
        }
        if let Ok(url) = std::env::var("ACCOUNT_URL") {
            cfg.storage.account_url = Some(url);
        }
        if let Ok(token) = std::env::var("SAS_TOKEN") {
            cfg.storage.sas_token = Some(token);
        }

        Ok(cfg)
    }
}
