//! Mock capabilities for testing
//!
//! Answers are keyed by the exact image bytes, so fixtures can use short
//! byte strings instead of real images. Unknown images get a neutral answer:
//! no QR code, no text, a non-slip label.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::ClassificationResult;

use super::{ImageClassifier, OcrReader, QrDecoder};

/// Label returned for images without a configured answer
pub const MOCK_DEFAULT_LABEL: &str = "other";

#[derive(Debug, Clone, Default)]
pub struct MockQrDecoder {
    payloads: HashMap<Vec<u8>, Vec<String>>,
    unreadable: Vec<Vec<u8>>,
    decodes: Arc<AtomicUsize>,
}

impl MockQrDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(mut self, image: &[u8], payload: &str) -> Self {
        self.payloads
            .entry(image.to_vec())
            .or_default()
            .push(payload.to_string());
        self
    }

    /// How many times `decode` has run, across clones
    pub fn decodes(&self) -> usize {
        self.decodes.load(Ordering::Relaxed)
    }

    /// Make decoding this image fail
    pub fn with_unreadable(mut self, image: &[u8]) -> Self {
        self.unreadable.push(image.to_vec());
        self
    }
}

impl QrDecoder for MockQrDecoder {
    fn name(&self) -> &str {
        "mock"
    }

    fn decode(&self, image: &[u8]) -> Result<Vec<String>> {
        self.decodes.fetch_add(1, Ordering::Relaxed);
        if self.unreadable.iter().any(|u| u == image) {
            return Err(Error::InvalidData("mock: unreadable image".into()));
        }
        Ok(self.payloads.get(image).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Clone)]
enum OcrAnswer {
    Fragments(Vec<String>),
    Failure,
    Stall(Duration),
}

#[derive(Debug, Clone)]
pub struct MockOcrReader {
    answers: HashMap<Vec<u8>, OcrAnswer>,
    /// Whether health_check should return true
    pub healthy: bool,
}

impl Default for MockOcrReader {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOcrReader {
    /// Create a new mock reader (healthy by default)
    pub fn new() -> Self {
        Self {
            answers: HashMap::new(),
            healthy: true,
        }
    }

    /// Recognize `fragments`, in this order, for the image
    pub fn with_text(mut self, image: &[u8], fragments: &[&str]) -> Self {
        let fragments = fragments.iter().map(|f| f.to_string()).collect();
        self.answers
            .insert(image.to_vec(), OcrAnswer::Fragments(fragments));
        self
    }

    pub fn with_failure(mut self, image: &[u8]) -> Self {
        self.answers.insert(image.to_vec(), OcrAnswer::Failure);
        self
    }

    /// Sleep this long before answering with no text
    pub fn with_stall(mut self, image: &[u8], delay: Duration) -> Self {
        self.answers.insert(image.to_vec(), OcrAnswer::Stall(delay));
        self
    }
}

#[async_trait]
impl OcrReader for MockOcrReader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn read(&self, image: &[u8], _languages: &[String]) -> Result<Vec<String>> {
        match self.answers.get(image) {
            Some(OcrAnswer::Fragments(fragments)) => Ok(fragments.clone()),
            Some(OcrAnswer::Failure) => Err(Error::InvalidData("mock: OCR failure".into())),
            Some(OcrAnswer::Stall(delay)) => {
                tokio::time::sleep(*delay).await;
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }
}

#[derive(Debug, Clone)]
pub struct MockClassifier {
    labels: HashMap<Vec<u8>, ClassificationResult>,
    stalls: HashMap<Vec<u8>, Duration>,
    /// Whether health_check should return true
    pub healthy: bool,
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClassifier {
    pub fn new() -> Self {
        Self {
            labels: HashMap::new(),
            stalls: HashMap::new(),
            healthy: true,
        }
    }

    /// Sleep this long before answering
    pub fn with_stall(mut self, image: &[u8], delay: Duration) -> Self {
        self.stalls.insert(image.to_vec(), delay);
        self
    }

    pub fn with_label(mut self, image: &[u8], label: &str, confidence: f64) -> Self {
        self.labels.insert(
            image.to_vec(),
            ClassificationResult {
                label: label.to_string(),
                confidence,
            },
        );
        self
    }
}

#[async_trait]
impl ImageClassifier for MockClassifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn predict(&self, image: &[u8]) -> Result<ClassificationResult> {
        if let Some(delay) = self.stalls.get(image) {
            tokio::time::sleep(*delay).await;
        }
        Ok(self.labels.get(image).cloned().unwrap_or(ClassificationResult {
            label: MOCK_DEFAULT_LABEL.to_string(),
            confidence: 0.5,
        }))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }
}
