//! CLI argument definitions using clap
//!
//! This module contains the clap structs for parsing CLI arguments.
//! The command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Slipscan - Extract transactions from Thai bank transfer slips
#[derive(Parser)]
#[command(name = "slipscan")]
#[command(about = "OCR extraction and reporting for bank transfer slip archives", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "slipscan.db", global = true)]
    pub db: PathBuf,

    /// Pipeline config file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract transaction records from a slip archive
    Extract(ExtractArgs),

    /// Build a report from an exported artifact
    Report {
        /// Artifact path or URL (file://, http://, https://)
        #[arg(short, long)]
        artifact: String,

        /// Report type: summary, in_depth_analysis
        #[arg(short = 't', long = "type", default_value = "summary")]
        report_type: String,

        /// Case id (defaults to the artifact's)
        #[arg(long)]
        case_id: Option<String>,

        /// Case title (defaults to the artifact's)
        #[arg(long)]
        case_title: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Split an archive into matched and unmatched images by classifier label
    Separate {
        /// Zip archive of images
        #[arg(short, long)]
        archive: PathBuf,

        /// Output directory for matched.zip and unmatched.zip
        #[arg(short, long)]
        out: PathBuf,

        /// Label routed to matched.zip (defaults to the configured slip label)
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Classify OCR text from a file and show the extracted fields
    Inspect {
        /// Text file holding OCR output for one slip
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List extraction batches
    Batches {
        /// Maximum number of batches to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// List stored reports
    Reports {
        /// Only reports for this case
        #[arg(long)]
        case_id: Option<String>,
    },

    /// Show database and engine status
    Status,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Zip archive with slip images under Slip/
    #[arg(short, long)]
    pub archive: PathBuf,

    /// Case id written to the artifact
    #[arg(long)]
    pub case_id: Option<String>,

    /// Case title written to the artifact
    #[arg(long)]
    pub case_title: Option<String>,

    /// Evidence id written to the artifact
    #[arg(long)]
    pub evidence_id: Option<String>,

    /// Directory that receives the artifact
    #[arg(short, long, default_value = "artifacts")]
    pub out: PathBuf,

    /// Dump raw OCR text per image into this directory
    #[arg(long)]
    pub raw_text_dir: Option<PathBuf>,

    /// Drop images the classifier does not label as slips
    #[arg(long)]
    pub prefilter: bool,
}
