//! Error types for the OCR gateway
//!
//! Every failure a job can produce is one of these kinds. The wire shape
//! is always `{"error": message}`; the status code depends on the kind.
//! Note that `Internal` maps to 400, not 500 — in-job failures are
//! reported to the submitting caller as bad-request responses, which is
//! the contract downstream consumers already depend on.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, OcrError>;

/// Failure kinds for an OCR job
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OcrError {
    /// The request is missing the required input reference field.
    #[error("The \"imagePath\" field is required.")]
    InvalidInput,

    /// The input reference does not resolve to a file on disk.
    #[error("The file {0} was not found.")]
    NotFound(String),

    /// Vector-to-raster conversion failed before the recognizer ran.
    #[error("Failed to convert SVG: {0}")]
    Preprocess(String),

    /// The recognizer returned a structurally empty result. Empty
    /// recognition is surfaced as a failure, never as a 200 with an
    /// empty list — a debatable policy, but the observed one.
    #[error("No text detected in the image.")]
    NoTextDetected,

    /// Any other failure from the recognizer or the job's own runtime;
    /// the message is forwarded to the caller verbatim.
    #[error("{0}")]
    Internal(String),

    /// The admission gate did not yield a slot within the configured
    /// wait bound. Only reachable when an acquire timeout is set.
    #[error("The OCR service is at capacity; try again later.")]
    Busy,
}

impl OcrError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Busy => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidInput
            | Self::Preprocess(_)
            | Self::NoTextDetected
            | Self::Internal(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for OcrError {
    fn into_response(self) -> Response {
        if let OcrError::Internal(msg) = &self {
            tracing::error!("internal job failure: {}", msg);
        }
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (self.status_code(), body).into_response()
    }
}

impl From<std::io::Error> for OcrError {
    fn from(e: std::io::Error) -> Self {
        OcrError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_kinds() {
        assert_eq!(OcrError::InvalidInput.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            OcrError::NotFound("x.png".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            OcrError::Preprocess("bad root".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(OcrError::NoTextDetected.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            OcrError::Internal("boom".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(OcrError::Busy.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn messages_keep_the_observed_wording() {
        assert_eq!(
            OcrError::NotFound("/tmp/a.png".into()).to_string(),
            "The file /tmp/a.png was not found."
        );
        assert_eq!(
            OcrError::NoTextDetected.to_string(),
            "No text detected in the image."
        );
        assert_eq!(OcrError::Internal("cuda OOM".into()).to_string(), "cuda OOM");
    }
}
