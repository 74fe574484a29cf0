//! Recognizer collaborator interface
//!
//! The OCR model itself is an external collaborator: loaded once at
//! process startup, held in accelerator memory for the process
//! lifetime, and opaque to this crate. Everything here is the seam the
//! core talks through; the model may only be invoked by a job that
//! holds an admission slot.

mod sidecar;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

pub use sidecar::SidecarRecognizer;

/// One recognized region, in the order the model emitted it.
#[derive(Debug, Clone)]
pub struct Detection {
    pub text: String,
    pub confidence: f64,
}

/// The shared recognizer handle.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Run inference on a raster image reference.
    ///
    /// `Ok(None)` is the model's structural "nothing found" signal; the
    /// caller decides what that means. Detection order is the model's
    /// own and must be preserved downstream.
    async fn recognize(&self, raster: &Path) -> Result<Option<Vec<Detection>>>;

    /// Release transient accelerator memory held by the last
    /// invocation. Called by the slot holder immediately before its
    /// slot is returned, so the next holder observes a settled device.
    /// Must not fail the job: implementations log and swallow errors.
    async fn reclaim(&self);
}

/// Process-wide recognizer handle, initialized once at startup.
pub type SharedRecognizer = Arc<dyn Recognizer>;
