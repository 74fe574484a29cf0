//! HTTP sidecar recognizer
//!
//! Production deployments run the neural OCR model in a sidecar process
//! that owns the accelerator. This client submits raster bytes to it
//! and maps its response onto the [`Recognizer`] contract.

use std::path::Path;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;

use super::{Detection, Recognizer};
use crate::config::RecognizerConfig;
use crate::error::{OcrError, Result};

pub struct SidecarRecognizer {
    client: reqwest::Client,
    base_url: String,
    language: String,
}

impl SidecarRecognizer {
    pub fn new(config: &RecognizerConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            language: config.language.clone(),
        })
    }

    /// Probe the sidecar's health endpoint. Used at startup to log
    /// whether the model is reachable; the gateway starts either way.
    pub async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map(|resp| resp.status().is_success())
            .unwrap_or(false)
    }
}

/// Sidecar inference response. `results` is null when the model found
/// nothing in the image.
#[derive(Debug, Deserialize)]
struct PredictResponse {
    results: Option<Vec<PredictLine>>,
}

#[derive(Debug, Deserialize)]
struct PredictLine {
    text: String,
    #[serde(default)]
    score: f64,
}

#[async_trait]
impl Recognizer for SidecarRecognizer {
    async fn recognize(&self, raster: &Path) -> Result<Option<Vec<Detection>>> {
        let bytes = tokio::fs::read(raster).await?;

        let body = serde_json::json!({
            "image": BASE64.encode(&bytes),
            "lang": self.language,
        });

        let response = self
            .client
            .post(format!("{}/predict", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| OcrError::Internal(format!("recognizer request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(OcrError::Internal(format!(
                "recognizer returned status {}",
                response.status()
            )));
        }

        let parsed: PredictResponse = response
            .json()
            .await
            .map_err(|e| OcrError::Internal(format!("invalid recognizer response: {e}")))?;

        Ok(parsed.results.map(|lines| {
            lines
                .into_iter()
                .map(|line| Detection {
                    text: line.text,
                    confidence: line.score,
                })
                .collect()
        }))
    }

    async fn reclaim(&self) {
        // Ask the sidecar to drop its inference caches. Best effort:
        // a failed reclaim must never fail the job that just ran.
        if let Err(e) = self
            .client
            .post(format!("{}/reclaim", self.base_url))
            .send()
            .await
        {
            tracing::warn!("recognizer reclaim request failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_results_deserialize_to_nothing_found() {
        let parsed: PredictResponse = serde_json::from_str(r#"{"results": null}"#).unwrap();
        assert!(parsed.results.is_none());
    }

    #[test]
    fn detection_order_is_taken_from_the_payload() {
        let parsed: PredictResponse = serde_json::from_str(
            r#"{"results": [
                {"text": "A", "score": 0.99},
                {"text": "B", "score": 0.98},
                {"text": "C"}
            ]}"#,
        )
        .unwrap();
        let lines = parsed.results.unwrap();
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["A", "B", "C"]);
        assert_eq!(lines[2].score, 0.0);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = RecognizerConfig {
            endpoint: "http://localhost:8868/".to_string(),
            language: "en".to_string(),
            request_timeout_secs: 5,
        };
        let recognizer = SidecarRecognizer::new(&config).unwrap();
        assert_eq!(recognizer.base_url, "http://localhost:8868");
    }
}
