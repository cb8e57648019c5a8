pub mod audio;
pub mod config;
pub mod http;
pub mod nats;
pub mod recording;
pub mod storage;
pub mod transcription;

pub use audio::{extract_audio, PcmAudio};
pub use config::Config;
pub use http::{create_router, AppState};
pub use nats::{AudioFrameMessage, NatsClient, TranscriptMessage};
pub use recording::{Recorder, RecordingError, RecordingInfo, SessionIds};
pub use storage::{AzureBlobStore, BlobStore, MemoryBlobStore, StorageError};
pub use transcription::Transcriber;
