//! Job execution
//!
//! Each admitted job runs on its own tokio task and reports back over a
//! one-shot channel. The task owns the admission slot for its whole
//! lifetime and the cleanup contract is unconditional: whatever the job
//! does — succeed, fail, or panic — transient device memory is
//! reclaimed and the slot is released exactly once before the outcome
//! (or the closed channel) reaches the caller.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::sync::oneshot;

use super::{Job, Outcome};
use crate::admission::SlotPermit;
use crate::error::OcrError;
use crate::preprocess;
use crate::recognizer::{Recognizer, SharedRecognizer};

/// Run `job` on its own task while holding `permit`.
///
/// The returned receiver is the job's result channel: it yields exactly
/// one outcome. If the receiver resolves with an error the worker died
/// without reporting (a panic); the slot has still been released.
pub fn spawn(
    job: Job,
    permit: SlotPermit,
    recognizer: SharedRecognizer,
) -> oneshot::Receiver<Outcome> {
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let slot = permit;

        // Panics inside the job become a Failed outcome instead of
        // tearing down the task before cleanup.
        let outcome = AssertUnwindSafe(run_admitted(&job, recognizer.as_ref()))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(OcrError::Internal("OCR job panicked".to_string())));

        // Cleanup runs on every path: settle the device while the slot
        // is still held, then release the slot, then signal the caller.
        recognizer.reclaim().await;
        drop(slot);

        if tx.send(outcome).is_err() {
            tracing::warn!(job_id = %job.id, "caller went away before the outcome was delivered");
        }
    });

    rx
}

/// The admitted portion of a job: validate, normalize, recognize,
/// interpret. Every failure is returned as a value; nothing escapes.
async fn run_admitted(job: &Job, recognizer: &dyn Recognizer) -> Outcome {
    if job.image_path.as_os_str().is_empty() {
        return Err(OcrError::InvalidInput);
    }
    if !tokio::fs::try_exists(&job.image_path).await.unwrap_or(false) {
        return Err(OcrError::NotFound(job.image_path.display().to_string()));
    }

    let raster = preprocess::normalize(&job.image_path).await?;

    tracing::debug!(job_id = %job.id, raster = %raster.display(), "invoking recognizer");
    let detections = recognizer.recognize(&raster).await?;

    match detections {
        None => Err(OcrError::NoTextDetected),
        Some(lines) if lines.is_empty() => Err(OcrError::NoTextDetected),
        Some(lines) => Ok(lines.into_iter().map(|d| d.text).collect()),
    }
}
