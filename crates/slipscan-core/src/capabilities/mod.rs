//! External capabilities consumed by the pipeline
//!
//! The pipeline never recognizes text, classifies images, or decodes QR
//! codes itself. It talks to these traits, and [`crate::engines::Engines`]
//! holds the provisioned implementations.
//!
//! # Provided implementations
//!
//! - `HttpOcrReader`, `HttpImageClassifier`: JSON clients for a model sidecar
//! - `RqrrDecoder`: in-process QR detection
//! - `LocalBlobStore`: filesystem storage for exported artifacts
//! - `MockOcrReader`, `MockClassifier`, `MockQrDecoder`: canned answers keyed by image bytes
//!
//! # Configuration
//!
//! Environment variables:
//! - `SLIPSCAN_BACKEND`: `http` (default) or `mock`
//! - `SLIPSCAN_OCR_HOST`: OCR sidecar URL
//! - `SLIPSCAN_CLASSIFIER_HOST`: classifier sidecar URL

mod blob;
mod http;
pub mod mock;
mod qr_decoder;

pub use blob::LocalBlobStore;
pub use http::{HttpImageClassifier, HttpOcrReader};
pub use mock::{MockClassifier, MockOcrReader, MockQrDecoder};
pub use qr_decoder::RqrrDecoder;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::ClassificationResult;

/// Binary slip / non-slip image labelling
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    fn name(&self) -> &str;

    async fn predict(&self, image: &[u8]) -> Result<ClassificationResult>;

    async fn health_check(&self) -> bool;
}

/// Classify one image, giving up after `budget`
pub async fn predict_within(
    classifier: &dyn ImageClassifier,
    image: &[u8],
    budget: Duration,
) -> Result<ClassificationResult> {
    tokio::time::timeout(budget, classifier.predict(image))
        .await
        .map_err(|_| Error::Timeout(format!("classifier exceeded {:?}", budget)))?
}

/// Multi-language text recognition
#[async_trait]
pub trait OcrReader: Send + Sync {
    fn name(&self) -> &str;

    /// Recognized text fragments, in engine order
    async fn read(&self, image: &[u8], languages: &[String]) -> Result<Vec<String>>;

    async fn health_check(&self) -> bool;
}

/// QR code decoding
///
/// Returns the payload of every code found; an empty list means the image
/// decoded but held no code.
pub trait QrDecoder: Send + Sync {
    fn name(&self) -> &str;

    fn decode(&self, image: &[u8]) -> Result<Vec<String>>;
}

/// Storage for exported artifacts
#[async_trait]
pub trait BlobStore: Send + Sync {
    fn name(&self) -> &str;

    /// Store bytes under a relative path, returning a URL that `get` accepts
    async fn put(&self, bytes: &[u8], path: &str, content_type: &str) -> Result<String>;

    async fn get(&self, url: &str) -> Result<Vec<u8>>;
}
