//! Status and listing commands (status, batches, reports)

use std::path::Path;

use anyhow::Result;
use slipscan_core::{Database, Engines, PipelineConfig, RecordRepository};

use super::{open_db, truncate};

pub async fn cmd_status(db_path: &Path, engines: &Engines, config: &PipelineConfig) -> Result<()> {
    println!();
    println!("📊 Slipscan Status");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Database: {}", db_path.display());

    if db_path.exists() {
        match open_db(db_path) {
            Ok(db) => {
                let batches = db.list_batches(usize::MAX)?;
                let records: i64 = batches.iter().map(|b| b.processed_count).sum();
                println!("   Batches: {}", batches.len());
                println!("   Records: {}", records);
                println!("   Reports: {}", db.list_reports(None)?.len());
            }
            Err(e) => println!("   ❌ Error opening database: {}", e),
        }
    } else {
        println!("   (database not initialized)");
    }

    println!();
    println!("   Pipeline");
    println!("     Slip directory:  {}", config.archive.slip_dir);
    println!("     Extensions:      {}", config.archive.extensions.join(", "));
    println!("     OCR languages:   {}", config.ocr_languages.join(", "));
    println!("     OCR timeout:     {}s", config.ocr_timeout.as_secs());
    println!("     Pre-filter:      {}", if config.prefilter { "on" } else { "off" });
    println!("     Classifier timeout: {}s", config.classifier_timeout.as_secs());
    println!("     Engine instances: {}", engines.instances());

    println!();
    println!("   Capabilities");
    for status in engines.status().await {
        let icon = match (&status.provider, status.healthy) {
            (Some(_), true) => "✅",
            (Some(_), false) => "⚠️ ",
            (None, _) => "❌",
        };
        println!(
            "     {} {:<11} {}",
            icon,
            status.capability,
            status.provider.as_deref().unwrap_or("not provisioned")
        );
    }
    if engines.ocr().is_none() {
        println!();
        println!("   💡 Tip: Set SLIPSCAN_OCR_HOST, or SLIPSCAN_BACKEND=mock for a dry run");
    }

    println!();
    Ok(())
}

pub fn cmd_batches(db: &Database, limit: usize) -> Result<()> {
    let batches = db.list_batches(limit)?;
    if batches.is_empty() {
        println!("No batches yet. Extract an archive with:");
        println!("  slipscan extract --archive slips.zip --case-id 1");
        return Ok(());
    }

    println!();
    println!("🧾 Extraction Batches");
    println!("   ─────────────────────────────");
    for b in batches {
        println!(
            "   #{:<4} {}  case {:<8} {:>3} processed, {:>3} skipped  {}",
            b.id,
            b.created_at.format("%Y-%m-%d %H:%M"),
            b.case_id.as_deref().unwrap_or("-"),
            b.processed_count,
            b.skipped_count,
            truncate(b.artifact_url.as_deref().unwrap_or(""), 48)
        );
    }
    Ok(())
}

pub fn cmd_reports(db: &Database, case_id: Option<&str>) -> Result<()> {
    let reports = db.list_reports(case_id)?;
    if reports.is_empty() {
        println!("No reports found.");
        return Ok(());
    }

    println!();
    println!("📈 Reports");
    println!("   ─────────────────────────────");
    for r in reports {
        println!(
            "   #{:<4} {}  {:<18} {}",
            r.id.unwrap_or_default(),
            r.created_at.format("%Y-%m-%d %H:%M"),
            r.report_type,
            truncate(&r.description, 48)
        );
    }
    Ok(())
}
