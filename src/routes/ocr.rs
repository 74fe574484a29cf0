//! The OCR submission endpoint
//!
//! `POST /ocr` with `{"imagePath": "..."}`. The handler validates the
//! request *before* touching the admission gate, so malformed or
//! dangling references never consume a concurrency slot, then blocks
//! until its job's outcome comes back over the result channel.

use std::path::Path;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::{OcrError, Result};
use crate::job::{runner, Job};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OcrRequest {
    /// Filesystem path of the image to recognize.
    #[serde(default, rename = "imagePath")]
    pub image_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OcrResponse {
    /// Recognized text lines, in the recognizer's own order.
    pub result: Vec<String>,
}

pub async fn recognize_image(
    State(state): State<AppState>,
    Json(request): Json<OcrRequest>,
) -> Result<Json<OcrResponse>> {
    let path = request.image_path.as_deref().map(str::trim).unwrap_or("");
    if path.is_empty() {
        return Err(OcrError::InvalidInput);
    }
    if !Path::new(path).exists() {
        return Err(OcrError::NotFound(path.to_string()));
    }

    let permit = state.gate().acquire().await?;

    let job = Job::new(path);
    tracing::info!(job_id = %job.id, path = %path, "job admitted");

    let result_channel = runner::spawn(job, permit, state.recognizer());
    let outcome = result_channel
        .await
        .map_err(|_| OcrError::Internal("OCR worker terminated before replying".to_string()))?;

    outcome.map(|lines| Json(OcrResponse { result: lines }))
}
