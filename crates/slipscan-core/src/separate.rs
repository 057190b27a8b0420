//! Image separation: split an archive by classifier label
//!
//! Every image entry is classified. Entries labelled with the configured
//! token go to the `matched` archive, everything else to `unmatched`.

use std::io::{Cursor, Write};
use std::time::Duration;

use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::archive::{is_separable_image, read_entries};
use crate::capabilities::predict_within;
use crate::config::PipelineConfig;
use crate::engines::Engines;
use crate::error::Result;
use crate::models::FileClassification;

/// Label reported for an image the classifier could not handle
pub const CLASSIFICATION_FAILED: &str = "error";

#[derive(Debug, Clone)]
pub struct SeparateOptions {
    /// Label that routes an image into the matched archive
    pub label: String,
    pub metadata_prefix: String,
    /// Per-image classifier budget; expiry labels the image as failed
    pub timeout: Duration,
}

impl SeparateOptions {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            label: config.slip_label.clone(),
            metadata_prefix: config.archive.metadata_prefix.clone(),
            timeout: config.classifier_timeout,
        }
    }
}

/// Two zip archives plus the per-file classifications behind the split
#[derive(Debug)]
pub struct Separation {
    pub matched: Vec<u8>,
    pub unmatched: Vec<u8>,
    pub classifications: Vec<FileClassification>,
}

impl Separation {
    pub fn matched_count(&self, label: &str) -> usize {
        self.classifications.iter().filter(|c| c.label == label).count()
    }
}

pub async fn separate_archive(
    engines: &Engines,
    archive_bytes: &[u8],
    options: &SeparateOptions,
) -> Result<Separation> {
    let classifier = engines.require_classifier()?;
    let _permit = engines.acquire().await?;

    let images = read_entries(archive_bytes, |path| {
        is_separable_image(path, &options.metadata_prefix)
    })?;
    info!(images = images.len(), label = %options.label, "Separating archive");

    let zip_options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut matched = ZipWriter::new(Cursor::new(Vec::new()));
    let mut unmatched = ZipWriter::new(Cursor::new(Vec::new()));
    let mut classifications = Vec::with_capacity(images.len());

    for image in &images {
        let prediction = predict_within(classifier.as_ref(), &image.bytes, options.timeout).await;
        let (label, confidence) = match prediction {
            Ok(result) => (result.label, result.confidence),
            Err(e) => {
                warn!(file = %image.path, "Classification failed: {}", e);
                (CLASSIFICATION_FAILED.to_string(), 0.0)
            }
        };
        debug!(file = %image.path, label = %label, confidence, "Classified");

        let target = if label == options.label {
            &mut matched
        } else {
            &mut unmatched
        };
        target.start_file(image.path.as_str(), zip_options)?;
        target.write_all(&image.bytes)?;

        classifications.push(FileClassification {
            filename: image.file_name().to_string(),
            label,
            confidence,
        });
    }

    Ok(Separation {
        matched: matched.finish()?.into_inner(),
        unmatched: unmatched.finish()?.into_inner(),
        classifications,
    })
}
