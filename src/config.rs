//! Configuration management for the OCR gateway

use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub admission: AdmissionConfig,
    pub recognizer: RecognizerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Admission gate tuning.
///
/// Deployments have run this anywhere from capacity 1 (single GPU,
/// cooldown between jobs) to 1000 (effectively unbounded); there is no
/// universally right value, so capacity is required configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AdmissionConfig {
    pub policy: AdmissionPolicy,
    /// Maximum concurrent recognizer invocations. Forced to 1 under
    /// the single-flight policy.
    pub capacity: usize,
    /// Idle interval enforced after a release before the slot may be
    /// reacquired. Only meaningful under the single-flight policy.
    pub cooldown_ms: u64,
    /// Optional bound on how long a caller may wait at the gate.
    /// `None` means callers wait indefinitely (the baseline behavior).
    pub acquire_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdmissionPolicy {
    /// N concurrent holders, unbounded FIFO queue of waiters behind them.
    Queue,
    /// One holder at a time, with a mandatory cooldown after each release.
    SingleFlight,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecognizerConfig {
    /// Base URL of the model sidecar.
    pub endpoint: String,
    /// Language hint forwarded to the model.
    pub language: String,
    /// Per-inference request timeout.
    pub request_timeout_secs: u64,
}

impl AdmissionConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout_ms.map(Duration::from_millis)
    }

    /// Effective pool size after the policy is applied.
    pub fn effective_capacity(&self) -> usize {
        match self.policy {
            AdmissionPolicy::Queue => self.capacity.max(1),
            AdmissionPolicy::SingleFlight => 1,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            admission: AdmissionConfig {
                policy: AdmissionPolicy::Queue,
                capacity: 2,
                cooldown_ms: 5000,
                acquire_timeout_ms: None,
            },
            recognizer: RecognizerConfig {
                endpoint: "http://localhost:8868".to_string(),
                language: "en".to_string(),
                request_timeout_secs: 120,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let defaults = Config::default();
        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env::var("SERVER_PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.server.port),
            },
            admission: AdmissionConfig {
                policy: parse_policy(
                    &env::var("OCR_ADMISSION_POLICY").unwrap_or_else(|_| "queue".to_string()),
                ),
                capacity: env::var("OCR_MAX_CONCURRENT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.admission.capacity),
                cooldown_ms: env::var("OCR_COOLDOWN_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.admission.cooldown_ms),
                acquire_timeout_ms: env::var("OCR_ACQUIRE_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok()),
            },
            recognizer: RecognizerConfig {
                endpoint: env::var("RECOGNIZER_URL").unwrap_or(defaults.recognizer.endpoint),
                language: env::var("RECOGNIZER_LANG").unwrap_or(defaults.recognizer.language),
                request_timeout_secs: env::var("RECOGNIZER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.recognizer.request_timeout_secs),
            },
        })
    }
}

fn parse_policy(s: &str) -> AdmissionPolicy {
    match s.to_ascii_lowercase().as_str() {
        "single-flight" | "single_flight" | "singleflight" => AdmissionPolicy::SingleFlight,
        _ => AdmissionPolicy::Queue,
    }
}
