//! OCR jobs
//!
//! A [`Job`] is created per incoming request, owned by the request
//! handler until it is handed to the runner, and destroyed once its
//! outcome is delivered.

pub mod runner;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;

/// One OCR job.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub image_path: PathBuf,
    pub submitted_at: DateTime<Utc>,
}

impl Job {
    pub fn new(image_path: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            image_path: image_path.into(),
            submitted_at: Utc::now(),
        }
    }
}

/// The single success-or-failure result produced per job. An empty
/// recognition never appears here as an empty success; it is mapped to
/// [`crate::error::OcrError::NoTextDetected`] before this is built.
pub type Outcome = Result<Vec<String>>;
