use crate::recording::Recorder;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Session operations over the process-wide storage client
    pub recorder: Arc<Recorder>,
}

impl AppState {
    pub fn new(recorder: Recorder) -> Self {
        Self {
            recorder: Arc::new(recorder),
        }
    }
}
