//! HTTP API for browser recorders
//!
//! This module provides the JSON API clients drive during a recording:
//! - POST /api/start_recording - Create a session (container + blob IDs)
//! - POST /api/stream_recording - Append a base64 chunk (alias /api/append_blob)
//! - GET /api/stop_recording - Fetch recording metadata and transcript link
//! - GET /health - Health check

mod error;
mod handlers;
mod routes;
mod state;

pub use error::ErrorResponse;
pub use handlers::{
    ChunkRequest, StartRecordingResponse, StreamRecordingResponse, VideoRequest, VideoResponse,
};
pub use routes::create_router;
pub use state::AppState;
