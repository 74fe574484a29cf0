//! Application state management

use std::sync::Arc;

use crate::admission::AdmissionGate;
use crate::config::Config;
use crate::recognizer::SharedRecognizer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    gate: AdmissionGate,
    recognizer: SharedRecognizer,
}

impl AppState {
    /// Create the application state around a process-wide recognizer
    /// handle. The handle is initialized once at startup and never
    /// reloaded; the gate is built from the admission configuration.
    pub fn new(config: Config, recognizer: SharedRecognizer) -> Self {
        let gate = AdmissionGate::new(&config.admission);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                gate,
                recognizer,
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.inner.gate
    }

    pub fn recognizer(&self) -> SharedRecognizer {
        Arc::clone(&self.inner.recognizer)
    }
}
