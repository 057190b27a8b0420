//! Image separation command

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use slipscan_core::{separate_archive, Engines, PipelineConfig, SeparateOptions, Separation};

pub const MATCHED_FILE: &str = "matched.zip";
pub const UNMATCHED_FILE: &str = "unmatched.zip";

pub async fn cmd_separate(
    engines: &Engines,
    config: &PipelineConfig,
    archive: &Path,
    out: &Path,
    label: Option<&str>,
) -> Result<Separation> {
    let bytes = fs::read(archive)
        .with_context(|| format!("Failed to read archive {}", archive.display()))?;

    let mut options = SeparateOptions::from_config(config);
    if let Some(label) = label {
        options.label = label.to_string();
    }

    println!("🗂️  Separating {} by label '{}'...", archive.display(), options.label);

    let separation = separate_archive(engines, &bytes, &options)
        .await
        .context("Separation failed")?;

    fs::create_dir_all(out)
        .with_context(|| format!("Failed to create {}", out.display()))?;
    fs::write(out.join(MATCHED_FILE), &separation.matched)?;
    fs::write(out.join(UNMATCHED_FILE), &separation.unmatched)?;

    println!();
    for c in &separation.classifications {
        let marker = if c.label == options.label { "✓" } else { " " };
        println!("   {} {:<32} {:<10} {:.2}", marker, c.filename, c.label, c.confidence);
    }
    println!();
    println!(
        "✅ {} matched, {} unmatched → {}",
        separation.matched_count(&options.label),
        separation.classifications.len() - separation.matched_count(&options.label),
        out.display()
    );

    Ok(separation)
}
