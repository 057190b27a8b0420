//! Process-wide engine registry
//!
//! OCR and classification engines are expensive to start, so they are
//! created once at process start and shared by every run through an
//! `Engines` handle. A semaphore sized to the number of provisioned engine
//! instances bounds how many archive runs proceed at once.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{info, warn};

use crate::capabilities::{
    HttpImageClassifier, HttpOcrReader, ImageClassifier, MockClassifier, MockOcrReader,
    OcrReader, QrDecoder, RqrrDecoder,
};
use crate::config::PipelineConfig;
use crate::error::{Error, Result};

/// Shared handles to every provisioned capability
#[derive(Clone)]
pub struct Engines {
    classifier: Option<Arc<dyn ImageClassifier>>,
    ocr: Option<Arc<dyn OcrReader>>,
    qr: Arc<dyn QrDecoder>,
    permits: Arc<Semaphore>,
    instances: usize,
}

/// Provisioning and health of one capability
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityStatus {
    pub capability: &'static str,
    /// Implementation name, `None` when not provisioned
    pub provider: Option<String>,
    pub healthy: bool,
}

impl Engines {
    pub fn builder() -> EnginesBuilder {
        EnginesBuilder::default()
    }

    /// Build from environment variables
    ///
    /// `SLIPSCAN_BACKEND=mock` provisions mock OCR and classification.
    /// Otherwise they come from `SLIPSCAN_OCR_HOST` / `SLIPSCAN_CLASSIFIER_HOST`
    /// and stay unprovisioned when the variable is missing. QR decoding is
    /// always in-process.
    pub fn from_env(config: &PipelineConfig) -> Self {
        let backend = std::env::var("SLIPSCAN_BACKEND").unwrap_or_else(|_| "http".to_string());

        let builder = Self::builder().instances(config.engine_instances);
        let builder = match backend.to_lowercase().as_str() {
            "mock" => builder
                .with_ocr(Arc::new(MockOcrReader::new()))
                .with_classifier(Arc::new(MockClassifier::new())),
            other => {
                if other != "http" {
                    warn!(backend = %backend, "Unknown SLIPSCAN_BACKEND, falling back to http");
                }
                let mut builder = builder;
                if let Some(ocr) = HttpOcrReader::from_env() {
                    builder = builder.with_ocr(Arc::new(ocr));
                }
                if let Some(classifier) = HttpImageClassifier::from_env() {
                    builder = builder.with_classifier(Arc::new(classifier));
                }
                builder
            }
        };

        builder.build()
    }

    pub fn ocr(&self) -> Option<&Arc<dyn OcrReader>> {
        self.ocr.as_ref()
    }

    pub fn classifier(&self) -> Option<&Arc<dyn ImageClassifier>> {
        self.classifier.as_ref()
    }

    pub fn qr(&self) -> &dyn QrDecoder {
        self.qr.as_ref()
    }

    /// The OCR engine, or `CapabilityUnavailable`
    pub fn require_ocr(&self) -> Result<Arc<dyn OcrReader>> {
        self.ocr
            .clone()
            .ok_or_else(|| Error::CapabilityUnavailable("OCR engine is not provisioned".into()))
    }

    /// The image classifier, or `CapabilityUnavailable`
    pub fn require_classifier(&self) -> Result<Arc<dyn ImageClassifier>> {
        self.classifier.clone().ok_or_else(|| {
            Error::CapabilityUnavailable("Image classifier is not provisioned".into())
        })
    }

    pub fn instances(&self) -> usize {
        self.instances
    }

    /// Engine instances not currently held by a run
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Wait for a free engine instance; held for the length of one run
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        self.permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::CapabilityUnavailable("Engines are shut down".into()))
    }

    /// Refuse new runs; runs already holding a permit finish normally
    pub fn shutdown(&self) {
        self.permits.close();
        info!("Engines shut down");
    }

    /// Provisioning and health of every capability
    pub async fn status(&self) -> Vec<CapabilityStatus> {
        let ocr = match &self.ocr {
            Some(ocr) => CapabilityStatus {
                capability: "ocr",
                provider: Some(ocr.name().to_string()),
                healthy: ocr.health_check().await,
            },
            None => CapabilityStatus {
                capability: "ocr",
                provider: None,
                healthy: false,
            },
        };

        let classifier = match &self.classifier {
            Some(classifier) => CapabilityStatus {
                capability: "classifier",
                provider: Some(classifier.name().to_string()),
                healthy: classifier.health_check().await,
            },
            None => CapabilityStatus {
                capability: "classifier",
                provider: None,
                healthy: false,
            },
        };

        let qr = CapabilityStatus {
            capability: "qr",
            provider: Some(self.qr.name().to_string()),
            healthy: true,
        };

        vec![ocr, classifier, qr]
    }
}

#[derive(Default)]
pub struct EnginesBuilder {
    classifier: Option<Arc<dyn ImageClassifier>>,
    ocr: Option<Arc<dyn OcrReader>>,
    qr: Option<Arc<dyn QrDecoder>>,
    instances: Option<usize>,
}

impl EnginesBuilder {
    pub fn with_classifier(mut self, classifier: Arc<dyn ImageClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn OcrReader>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    /// Defaults to [`RqrrDecoder`] when not set
    pub fn with_qr(mut self, qr: Arc<dyn QrDecoder>) -> Self {
        self.qr = Some(qr);
        self
    }

    pub fn instances(mut self, instances: usize) -> Self {
        self.instances = Some(instances);
        self
    }

    pub fn build(self) -> Engines {
        let instances = self.instances.unwrap_or(1).max(1);
        Engines {
            classifier: self.classifier,
            ocr: self.ocr,
            qr: self
                .qr
                .unwrap_or_else(|| Arc::new(RqrrDecoder::new()) as Arc<dyn QrDecoder>),
            permits: Arc::new(Semaphore::new(instances)),
            instances,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_capabilities_are_reported() {
        let engines = Engines::builder().build();
        assert!(matches!(
            engines.require_ocr(),
            Err(Error::CapabilityUnavailable(_))
        ));
        assert!(matches!(
            engines.require_classifier(),
            Err(Error::CapabilityUnavailable(_))
        ));
        assert_eq!(engines.qr().name(), "rqrr");
        assert_eq!(engines.instances(), 1);
    }

    #[tokio::test]
    async fn test_permits_bound_concurrent_runs() {
        let engines = Engines::builder()
            .with_ocr(Arc::new(MockOcrReader::new()))
            .instances(2)
            .build();

        let first = engines.acquire().await.unwrap();
        let _second = engines.acquire().await.unwrap();
        assert_eq!(engines.available_permits(), 0);

        drop(first);
        assert_eq!(engines.available_permits(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_refuses_new_runs() {
        let engines = Engines::builder().build();
        engines.shutdown();
        assert!(engines.acquire().await.is_err());
    }

    #[tokio::test]
    async fn test_status_lists_every_capability() {
        let engines = Engines::builder()
            .with_ocr(Arc::new(MockOcrReader::new()))
            .build();
        let status = engines.status().await;

        assert_eq!(status.len(), 3);
        assert_eq!(status[2].capability, "qr");
        assert_eq!(status[0].provider.as_deref(), Some("mock"));
        assert!(status[0].healthy);
        assert_eq!(status[1].provider, None);
        assert!(!status[1].healthy);
    }
}
