use super::state::AppState;
use crate::recording::RecordingError;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::info;

const FOLDER_CREATED: &str = "FOLDER CREATED SUCCESSFULLY";
const CHUNK_APPENDED: &str = "Binary data appended successfully.";
const VIDEO_RETRIEVED: &str = "Video Retrieved Successfully";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct StartRecordingResponse {
    pub folder_name: String,
    pub blob_name: String,
    pub status_code: u16,
    pub message: String,
}

/// One chunk of a recording
#[derive(Debug, Serialize, Deserialize)]
pub struct ChunkRequest {
    /// Base64-encoded binary data
    pub data: String,
    pub blob_name: String,
    pub folder_name: String,
    /// MIME type of the content, e.g. `video/mp4` or `video/webm`
    pub content_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StreamRecordingResponse {
    pub status_code: u16,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VideoRequest {
    pub folder_name: String,
    pub blob_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VideoResponse {
    pub status_code: u16,
    pub message: String,
    pub video_url: String,
    pub creation_time: String,
    pub modified_time: String,
    pub content_type: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_url: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/start_recording
/// Create a session container and hand out its identifiers
pub async fn start_recording(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, RecordingError> {
    let ids = state.recorder.start_session().await?;

    Ok((
        StatusCode::CREATED,
        Json(StartRecordingResponse {
            folder_name: ids.folder_name,
            blob_name: ids.blob_name,
            status_code: StatusCode::CREATED.as_u16(),
            message: FOLDER_CREATED.to_string(),
        }),
    ))
}

/// POST /api/stream_recording (alias: /api/append_blob)
/// Append one base64 chunk to the recording blob
///
/// Body rejections (missing fields, bad JSON, wrong content type) are
/// answered as 422 with the usual `detail` body.
pub async fn stream_recording(
    State(state): State<AppState>,
    payload: Result<Json<ChunkRequest>, JsonRejection>,
) -> Result<impl IntoResponse, RecordingError> {
    let Json(chunk) = payload.map_err(|e| RecordingError::InvalidRequest(e.body_text()))?;

    state
        .recorder
        .append_chunk(
            &chunk.folder_name,
            &chunk.blob_name,
            &chunk.data,
            &chunk.content_type,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(StreamRecordingResponse {
            status_code: StatusCode::CREATED.as_u16(),
            message: CHUNK_APPENDED.to_string(),
        }),
    ))
}

/// GET /api/stop_recording
/// Return recording metadata (and transcript link when enabled)
///
/// Identifiers come from a JSON body, or from the query string when the
/// body is empty.
pub async fn stop_recording(
    State(state): State<AppState>,
    uri: Uri,
    body: Bytes,
) -> Result<impl IntoResponse, RecordingError> {
    let request = parse_video_request(&uri, &body)?;

    let recording = state
        .recorder
        .finish(&request.folder_name, &request.blob_name)
        .await?;

    info!("Recording {} retrieved", request.blob_name);

    Ok((
        StatusCode::OK,
        Json(VideoResponse {
            status_code: StatusCode::OK.as_u16(),
            message: VIDEO_RETRIEVED.to_string(),
            video_url: recording.video_url,
            creation_time: recording.creation_time,
            modified_time: recording.modified_time,
            content_type: recording.content_type,
            title: recording.title,
            transcript_url: recording.transcript_url,
        }),
    ))
}

fn parse_video_request(uri: &Uri, body: &[u8]) -> Result<VideoRequest, RecordingError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        let Query(request) = Query::<VideoRequest>::try_from_uri(uri)
            .map_err(|e| RecordingError::InvalidRequest(e.body_text()))?;
        return Ok(request);
    }

    serde_json::from_slice(body).map_err(|e| RecordingError::InvalidRequest(e.to_string()))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
