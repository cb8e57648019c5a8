//! Recording sessions
//!
//! A session is a storage container; the recording is an append blob inside
//! it. `Recorder` implements the three operations clients drive:
//! - `start_session` - allocate IDs and provision a public container
//! - `append_chunk` - decode and append one base64 chunk
//! - `finish` - report blob metadata, optionally with a transcript

mod error;
mod session;

pub use error::RecordingError;
pub use session::{Recorder, RecordingInfo, SessionIds, TRANSCRIPT_BLOB_NAME};
