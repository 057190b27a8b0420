//! Archive extraction command

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use slipscan_core::capabilities::{BlobStore, LocalBlobStore};
use slipscan_core::export::{artifact_bytes, ArtifactMetadata, CONTENT_TYPE};
use slipscan_core::{
    BatchMetadata, Database, Engines, PipelineConfig, RecordRepository, RunOptions, SlipPipeline,
};
use tracing::info;

use crate::cli::ExtractArgs;

/// Run the pipeline, store the artifact and persist the batch; returns the batch id
pub async fn cmd_extract(
    db: &Database,
    engines: &Engines,
    config: &PipelineConfig,
    args: &ExtractArgs,
) -> Result<i64> {
    let archive = fs::read(&args.archive)
        .with_context(|| format!("Failed to read archive {}", args.archive.display()))?;

    println!("🧾 Extracting slips from {}...", args.archive.display());

    let options = RunOptions {
        case_id: args.case_id.clone(),
        raw_text_dir: args.raw_text_dir.clone(),
        prefilter: args.prefilter.then_some(true),
    };
    let batch = SlipPipeline::new(config.clone())
        .process_archive(engines, &archive, &options)
        .await
        .context("Extraction failed")?;

    let metadata = ArtifactMetadata::new(
        args.case_id.as_deref().unwrap_or(""),
        args.case_title.as_deref().unwrap_or(""),
        args.evidence_id.as_deref().unwrap_or(""),
    );
    let bytes = artifact_bytes(&metadata, &batch.records)?;

    let store = LocalBlobStore::new(&args.out);
    let artifact_path = artifact_path(args.case_id.as_deref(), &args.archive, &batch.archive_sha256);
    let url = store
        .put(&bytes, &artifact_path, CONTENT_TYPE)
        .await
        .context("Failed to store artifact")?;
    info!(url = %url, "Artifact exported");

    let batch_id = db.insert_batch(
        &BatchMetadata {
            case_id: args.case_id.clone(),
            case_title: args.case_title.clone(),
            evidence_id: args.evidence_id.clone(),
            artifact_url: Some(url.clone()),
        },
        &batch,
    )?;

    println!();
    println!("📊 Extraction Results (batch #{})", batch_id);
    println!("   ─────────────────────────────");
    println!("   Candidates:  {}", batch.candidate_count);
    println!("   Processed:   {}", batch.processed_count);
    println!("   Skipped:     {} (no QR code)", batch.skipped_count - batch.rejected_count);
    if batch.rejected_count > 0 {
        println!("   Rejected:    {} (not a slip)", batch.rejected_count);
    }
    if batch.unreadable_count > 0 {
        println!("   ⚠️  Unreadable: {}", batch.unreadable_count);
    }
    println!();
    println!("   Artifact: {}", url);

    Ok(batch_id)
}

/// `<case>/<archive stem>_<sha prefix>.csv`
fn artifact_path(case_id: Option<&str>, archive: &Path, sha256: &str) -> String {
    let case_dir = match case_id {
        Some(id) if !id.is_empty() => format!("case_{}", id),
        _ => "uncategorized".to_string(),
    };
    let stem = archive
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("slips");
    let prefix = sha256.get(..8).unwrap_or(sha256);
    format!("{}/{}_{}.csv", case_dir, stem, prefix)
}
