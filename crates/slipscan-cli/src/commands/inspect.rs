//! Offline slip text inspection

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use slipscan_core::extract::extract_record;
use slipscan_core::models::{TransactionRecord, RECORD_COLUMNS};
use slipscan_core::qr::IMAGE_UNAVAILABLE;
use slipscan_core::{detect_bank, PLACEHOLDER};

/// Classify OCR text and show what each extractor field recovered
///
/// Works on text alone, so no engines are needed and the QR column always
/// reports the image as unavailable.
pub fn cmd_inspect(file: &Path) -> Result<TransactionRecord> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let bank = detect_bank(&text);
    let record = extract_record(bank, &text, name, IMAGE_UNAVAILABLE);

    println!();
    println!("🔎 {} → {}", name, bank);
    println!("   ─────────────────────────────");
    for (column, value) in RECORD_COLUMNS.iter().zip(record.fields()).skip(2) {
        let marker = if value == PLACEHOLDER { "·" } else { "✓" };
        println!("   {} {:<14} {}", marker, column, value);
    }
    println!();
    println!("   {} of 9 fields found", record.populated_fields());

    Ok(record)
}
