//! HTTP clients for a model sidecar
//!
//! The OCR and classification models run out of process (they are large and
//! slow to load). Images travel base64-encoded in JSON.
//!
//! - `POST {host}/ocr` with `{"image", "languages"}` returns `{"fragments": [...]}`
//! - `POST {host}/classify` with `{"image"}` returns `{"label", "confidence"}`
//! - `GET {host}/health` answers 2xx when the models are loaded

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::ClassificationResult;

use super::{ImageClassifier, OcrReader};

#[derive(Debug, Serialize)]
struct OcrRequest<'a> {
    image: String,
    languages: &'a [String],
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    fragments: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ClassifyRequest {
    image: String,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    label: String,
    confidence: f64,
}

fn encode_image(image: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(image)
}

async fn sidecar_healthy(client: &Client, base_url: &str) -> bool {
    match client.get(format!("{}/health", base_url)).send().await {
        Ok(resp) => resp.status().is_success(),
        Err(_) => false,
    }
}

/// OCR served by a sidecar
#[derive(Clone)]
pub struct HttpOcrReader {
    http_client: Client,
    base_url: String,
}

impl HttpOcrReader {
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create from `SLIPSCAN_OCR_HOST`
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("SLIPSCAN_OCR_HOST").ok()?;
        Some(Self::new(&host))
    }

    pub fn host(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl OcrReader for HttpOcrReader {
    fn name(&self) -> &str {
        "http-ocr"
    }

    async fn read(&self, image: &[u8], languages: &[String]) -> Result<Vec<String>> {
        let request = OcrRequest {
            image: encode_image(image),
            languages,
        };

        let response = self
            .http_client
            .post(format!("{}/ocr", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: OcrResponse = response.json().await?;
        debug!("OCR sidecar returned {} fragments", body.fragments.len());
        Ok(body.fragments)
    }

    async fn health_check(&self) -> bool {
        sidecar_healthy(&self.http_client, &self.base_url).await
    }
}

/// Image classification served by a sidecar
#[derive(Clone)]
pub struct HttpImageClassifier {
    http_client: Client,
    base_url: String,
}

impl HttpImageClassifier {
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create from `SLIPSCAN_CLASSIFIER_HOST`
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("SLIPSCAN_CLASSIFIER_HOST").ok()?;
        Some(Self::new(&host))
    }

    pub fn host(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ImageClassifier for HttpImageClassifier {
    fn name(&self) -> &str {
        "http-classifier"
    }

    async fn predict(&self, image: &[u8]) -> Result<ClassificationResult> {
        let request = ClassifyRequest {
            image: encode_image(image),
        };

        let response = self
            .http_client
            .post(format!("{}/classify", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: ClassifyResponse = response.json().await?;
        if !(0.0..=1.0).contains(&body.confidence) {
            return Err(Error::InvalidData(format!(
                "Classifier confidence out of range: {}",
                body.confidence
            )));
        }

        Ok(ClassificationResult {
            label: body.label,
            confidence: body.confidence,
        })
    }

    async fn health_check(&self) -> bool {
        sidecar_healthy(&self.http_client, &self.base_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let ocr = HttpOcrReader::new("http://localhost:8500/");
        assert_eq!(ocr.host(), "http://localhost:8500");
        let classifier = HttpImageClassifier::new("http://localhost:8501//");
        assert_eq!(classifier.host(), "http://localhost:8501");
    }

    #[test]
    fn test_ocr_request_shape() {
        let languages = vec!["th".to_string(), "en".to_string()];
        let request = OcrRequest {
            image: encode_image(b"abc"),
            languages: &languages,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["image"], "YWJj");
        assert_eq!(json["languages"][0], "th");
    }

    #[tokio::test]
    async fn test_unreachable_sidecar_is_unhealthy() {
        // Port 9 (discard) is not an HTTP server
        let ocr = HttpOcrReader::new("http://127.0.0.1:9");
        assert!(!ocr.health_check().await);
    }
}
