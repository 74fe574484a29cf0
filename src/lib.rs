//! OCR Gateway Library
//!
//! Admission-controlled HTTP front for a scarce OCR model. The binary
//! lives in main.rs; this crate root exposes the modules so the
//! integration tests can assemble the router against stub recognizers.
//!
//! # Modules
//!
//! - `admission`: bounded-concurrency gate around the recognizer
//! - `job`: per-request jobs, runner task, result channel
//! - `preprocess`: vector-to-raster normalization
//! - `recognizer`: the model collaborator seam and its sidecar client
//! - `routes`: axum handlers and router assembly

pub mod admission;
pub mod config;
pub mod error;
pub mod job;
pub mod preprocess;
pub mod recognizer;
pub mod routes;
pub mod state;
