//! Archive to batch extraction
//!
//! One archive is one sequential pass over its candidate images:
//!
//! 1. optional classifier pre-filter (non-slips are rejected)
//! 2. QR presence gate (images without a code are skipped)
//! 3. dimension bounding, then OCR under a time budget
//! 4. bank detection and field extraction
//!
//! Only a malformed archive or a missing engine fails the run. Anything that
//! goes wrong with a single image is counted on the batch instead.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::aggregator::RecordAggregator;
use crate::archive::{self, ImageAsset};
use crate::capabilities::{predict_within, ImageClassifier, OcrReader};
use crate::classify::detect_bank;
use crate::config::PipelineConfig;
use crate::engines::Engines;
use crate::error::Result;
use crate::extract::extract_record;
use crate::models::{BankVariant, ExtractionBatch, TransactionRecord};
use crate::ocr::{read_text, OcrOutcome};
use crate::preprocess::bound_dimensions;
use crate::qr;

/// Per-run options
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Groups raw OCR dumps; `None` dumps under "uncategorized"
    pub case_id: Option<String>,
    /// Write each image's OCR text to `<dir>/<case>/<name>.txt`, where the
    /// name is the path below the slip directory with `/` turned into `_`
    pub raw_text_dir: Option<PathBuf>,
    /// Overrides `classifier.prefilter` from the config
    pub prefilter: Option<bool>,
}

/// Stateless extraction pipeline; safe to share between concurrent runs
#[derive(Debug, Clone)]
pub struct SlipPipeline {
    config: PipelineConfig,
}

impl SlipPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Extract one record per processed slip image in the archive
    pub async fn process_archive(
        &self,
        engines: &Engines,
        archive_bytes: &[u8],
        options: &RunOptions,
    ) -> Result<ExtractionBatch> {
        // Refuse to start without the engines this run needs
        let ocr = engines.require_ocr()?;
        let classifier = if options.prefilter.unwrap_or(self.config.prefilter) {
            Some(engines.require_classifier()?)
        } else {
            None
        };

        let _permit = engines.acquire().await?;

        let archive_sha256 = hex::encode(Sha256::digest(archive_bytes));
        let candidates = archive::read_candidates(archive_bytes, &self.config.archive)?;
        info!(
            candidates = candidates.len(),
            sha256 = %archive_sha256,
            "Processing slip archive"
        );

        let mut aggregator = RecordAggregator::new(candidates.len(), archive_sha256);
        for asset in &candidates {
            self.process_image(
                engines,
                ocr.as_ref(),
                classifier.as_deref(),
                asset,
                options,
                &mut aggregator,
            )
            .await;
        }

        let batch = aggregator.finish();
        info!(
            processed = batch.processed_count,
            skipped = batch.skipped_count,
            unreadable = batch.unreadable_count,
            rejected = batch.rejected_count,
            "Archive processed"
        );
        Ok(batch)
    }

    async fn process_image(
        &self,
        engines: &Engines,
        ocr: &dyn OcrReader,
        classifier: Option<&dyn ImageClassifier>,
        asset: &ImageAsset,
        options: &RunOptions,
        aggregator: &mut RecordAggregator,
    ) {
        let file = asset.file_name();

        if let Some(classifier) = classifier {
            let budget = self.config.classifier_timeout;
            match predict_within(classifier, &asset.bytes, budget).await {
                Ok(result) if result.is(&self.config.slip_label) => {}
                Ok(result) => {
                    debug!(
                        file = %file,
                        label = %result.label,
                        confidence = result.confidence,
                        "Not a slip"
                    );
                    aggregator.reject(file);
                    return;
                }
                Err(e) => {
                    warn!(file = %file, "Classification failed, rejecting image: {}", e);
                    aggregator.reject(file);
                    return;
                }
            }
        }

        let scan = qr::scan(engines.qr(), Some(asset.bytes.as_slice()));
        if !scan.has_code() {
            aggregator.skip(file);
            return;
        }

        let prepared = bound_dimensions(&asset.bytes, self.config.max_dimension);
        let outcome = read_text(
            ocr,
            &prepared,
            &self.config.ocr_languages,
            self.config.ocr_timeout,
        )
        .await;

        if let Some(dir) = &options.raw_text_dir {
            let name = dump_name(&asset.path, &self.config.archive.slip_dir);
            dump_raw_text(dir, options.case_id.as_deref(), &name, outcome.text().unwrap_or(""));
        }

        match outcome {
            OcrOutcome::Text(text) => {
                let bank = detect_bank(&text);
                let record = extract_record(bank, &text, file, &scan.payload());
                aggregator.record(record);
            }
            other => {
                info!(file = %file, outcome = ?other, "Image unreadable");
                let mut record = TransactionRecord::placeholder(file, BankVariant::Unknown);
                record.qr_code_text = scan.payload();
                aggregator.record_unreadable(record);
            }
        }
    }
}

/// Dump file stem for an entry: its path below the slip directory, flattened
fn dump_name(path: &str, slip_dir: &str) -> String {
    let relative = path.strip_prefix(slip_dir).unwrap_or(path);
    let stem = match relative.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() && !stem.ends_with('/') => stem,
        _ => relative,
    };
    stem.replace('/', "_")
}

/// Best effort: a failed dump is logged, never fatal
fn dump_raw_text(dir: &Path, case_id: Option<&str>, name: &str, text: &str) {
    let case_dir = match case_id {
        Some(id) => dir.join(format!("case_{}", id)),
        None => dir.join("uncategorized"),
    };
    let path = case_dir.join(format!("{}.txt", name));

    let written = fs::create_dir_all(&case_dir).and_then(|_| fs::write(&path, text));
    if let Err(e) = written {
        warn!("Failed to write OCR text {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{MockClassifier, MockOcrReader, MockQrDecoder};
    use crate::error::Error;
    use std::io::{Cursor, Write};
    use std::sync::Arc;
    use std::time::Duration;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn engines(ocr: MockOcrReader, qr: MockQrDecoder) -> Engines {
        Engines::builder()
            .with_ocr(Arc::new(ocr))
            .with_classifier(Arc::new(MockClassifier::new().with_label(b"slip-a", "slip", 0.99)))
            .with_qr(Arc::new(qr))
            .build()
    }

    #[tokio::test]
    async fn test_missing_ocr_refuses_to_start() {
        let engines = Engines::builder().build();
        let pipeline = SlipPipeline::new(PipelineConfig::default());
        let err = pipeline
            .process_archive(&engines, &build_zip(&[]), &RunOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CapabilityUnavailable(_)));
    }

    #[tokio::test]
    async fn test_prefilter_without_classifier_refuses_to_start() {
        let engines = Engines::builder()
            .with_ocr(Arc::new(MockOcrReader::new()))
            .with_qr(Arc::new(MockQrDecoder::new()))
            .build();
        let options = RunOptions {
            prefilter: Some(true),
            ..Default::default()
        };
        let err = SlipPipeline::new(PipelineConfig::default())
            .process_archive(&engines, &build_zip(&[("Slip/a.png", "slip-a")]), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CapabilityUnavailable(_)));
    }

    #[tokio::test]
    async fn test_corrupt_archive_aborts() {
        let engines = engines(MockOcrReader::new(), MockQrDecoder::new());
        let pipeline = SlipPipeline::new(PipelineConfig::default());
        let err = pipeline
            .process_archive(&engines, b"garbage", &RunOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Structural(_)));
    }

    #[tokio::test]
    async fn test_unreadable_and_failed_images_still_emit_records() {
        let ocr = MockOcrReader::new()
            .with_text(b"slip-a", &["SCB", "จำนวนเงิน 10.00"])
            .with_failure(b"slip-b");
        let qr = MockQrDecoder::new()
            .with_payload(b"slip-a", "qr-a")
            .with_payload(b"slip-b", "qr-b")
            .with_payload(b"slip-c", "qr-c");
        let engines = engines(ocr, qr);
        let zip = build_zip(&[
            ("Slip/a.png", "slip-a"),
            ("Slip/b.png", "slip-b"),
            ("Slip/c.png", "slip-c"),
        ]);

        let batch = SlipPipeline::new(PipelineConfig::default())
            .process_archive(&engines, &zip, &RunOptions::default())
            .await
            .unwrap();

        assert_eq!(batch.processed_count, 3);
        assert_eq!(batch.unreadable_count, 2);
        assert_eq!(batch.records[0].bank, "SCB");
        assert_eq!(batch.records[0].amount, "10.00");
        assert_eq!(batch.records[1].bank, "UNKNOWN");
        assert_eq!(batch.records[1].qr_code_text, "qr-b");
        assert_eq!(batch.records[2].file, "c.png");
        assert!(batch.is_balanced());
    }

    #[tokio::test]
    async fn test_prefilter_rejects_non_slips() {
        let ocr = MockOcrReader::new().with_text(b"slip-a", &["SCB"]);
        let qr = MockQrDecoder::new()
            .with_payload(b"slip-a", "qr-a")
            .with_payload(b"cat", "qr-cat");
        let engines = engines(ocr, qr);
        let zip = build_zip(&[("Slip/a.png", "slip-a"), ("Slip/cat.jpg", "cat")]);
        let options = RunOptions {
            prefilter: Some(true),
            ..Default::default()
        };

        let batch = SlipPipeline::new(PipelineConfig::default())
            .process_archive(&engines, &zip, &options)
            .await
            .unwrap();

        assert_eq!(batch.processed_count, 1);
        assert_eq!(batch.skipped_count, 1);
        assert_eq!(batch.rejected_count, 1);
        assert!(batch.is_balanced());
    }

    #[tokio::test]
    async fn test_stalled_classifier_rejects_image() {
        let ocr = MockOcrReader::new().with_text(b"slip-b", &["SCB"]);
        let qr = MockQrDecoder::new()
            .with_payload(b"slip-a", "qr-a")
            .with_payload(b"slip-b", "qr-b");
        let classifier = MockClassifier::new()
            .with_stall(b"slip-a", Duration::from_secs(30))
            .with_label(b"slip-b", "slip", 0.95);
        let engines = Engines::builder()
            .with_ocr(Arc::new(ocr))
            .with_classifier(Arc::new(classifier))
            .with_qr(Arc::new(qr))
            .build();
        let config = PipelineConfig {
            classifier_timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let zip = build_zip(&[("Slip/a.png", "slip-a"), ("Slip/b.png", "slip-b")]);
        let options = RunOptions {
            prefilter: Some(true),
            ..Default::default()
        };

        let batch = SlipPipeline::new(config)
            .process_archive(&engines, &zip, &options)
            .await
            .unwrap();

        assert_eq!(batch.rejected_count, 1);
        assert_eq!(batch.processed_count, 1);
        assert_eq!(batch.records[0].file, "b.png");
        assert!(batch.is_balanced());
    }

    #[tokio::test]
    async fn test_each_image_decoded_once() {
        let ocr = MockOcrReader::new()
            .with_text(b"slip-a", &["SCB"])
            .with_failure(b"slip-b");
        let qr = Arc::new(
            MockQrDecoder::new()
                .with_payload(b"slip-a", "qr-a")
                .with_payload(b"slip-b", "qr-b"),
        );
        let engines = Engines::builder()
            .with_ocr(Arc::new(ocr))
            .with_qr(qr.clone())
            .build();
        let zip = build_zip(&[
            ("Slip/a.png", "slip-a"),
            ("Slip/b.png", "slip-b"),
            ("Slip/c.png", "no-code"),
        ]);

        let batch = SlipPipeline::new(PipelineConfig::default())
            .process_archive(&engines, &zip, &RunOptions::default())
            .await
            .unwrap();

        assert_eq!(qr.decodes(), 3);
        assert_eq!(batch.records[0].qr_code_text, "qr-a");
        assert_eq!(batch.records[1].qr_code_text, "qr-b");
    }

    #[tokio::test]
    async fn test_raw_text_dump() {
        let dir = tempfile::tempdir().unwrap();
        let ocr = MockOcrReader::new().with_text(b"slip-a", &["SCB", "โอนเงินสำเร็จ"]);
        let qr = MockQrDecoder::new().with_payload(b"slip-a", "qr-a");
        let engines = engines(ocr, qr);
        let zip = build_zip(&[("Slip/a.png", "slip-a")]);
        let options = RunOptions {
            case_id: Some("42".to_string()),
            raw_text_dir: Some(dir.path().to_path_buf()),
            prefilter: None,
        };

        SlipPipeline::new(PipelineConfig::default())
            .process_archive(&engines, &zip, &options)
            .await
            .unwrap();

        let dumped = fs::read_to_string(dir.path().join("case_42").join("a.txt")).unwrap();
        assert_eq!(dumped, "SCB โอนเงินสำเร็จ");
    }

    #[tokio::test]
    async fn test_raw_text_dump_keeps_same_named_files_apart() {
        let dir = tempfile::tempdir().unwrap();
        let ocr = MockOcrReader::new()
            .with_text(b"slip-a", &["first"])
            .with_text(b"slip-b", &["second"]);
        let qr = MockQrDecoder::new()
            .with_payload(b"slip-a", "qr-a")
            .with_payload(b"slip-b", "qr-b");
        let engines = engines(ocr, qr);
        let zip = build_zip(&[("Slip/a/1.png", "slip-a"), ("Slip/b/1.png", "slip-b")]);
        let options = RunOptions {
            raw_text_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };

        SlipPipeline::new(PipelineConfig::default())
            .process_archive(&engines, &zip, &options)
            .await
            .unwrap();

        let case_dir = dir.path().join("uncategorized");
        assert_eq!(fs::read_to_string(case_dir.join("a_1.txt")).unwrap(), "first");
        assert_eq!(fs::read_to_string(case_dir.join("b_1.txt")).unwrap(), "second");
    }

    #[test]
    fn test_dump_names() {
        assert_eq!(dump_name("Slip/a.png", "Slip/"), "a");
        assert_eq!(dump_name("Slip/x/y/1.jpeg", "Slip/"), "x_y_1");
        assert_eq!(dump_name("Slip/.hidden", "Slip/"), ".hidden");
    }
}
