//! Slipscan CLI - Bank transfer slip extraction
//!
//! Usage:
//!   slipscan extract --archive slips.zip --case-id 1   Extract records into an artifact
//!   slipscan report --artifact out.csv --type summary  Build a report
//!   slipscan separate --archive photos.zip --out dir   Split images by classifier label
//!   slipscan inspect --file slip.txt                   Show what extraction finds in OCR text

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use slipscan_core::Engines;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract(args) => {
            let db = commands::open_db(&cli.db)?;
            let engines = Engines::from_env(&config);
            let result = commands::cmd_extract(&db, &engines, &config, &args).await;
            engines.shutdown();
            result.map(|_| ())
        }
        Commands::Report {
            artifact,
            report_type,
            case_id,
            case_title,
            json,
        } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_report(
                &db,
                &artifact,
                &report_type,
                case_id.as_deref(),
                case_title.as_deref(),
                json,
            )
            .await
            .map(|_| ())
        }
        Commands::Separate {
            archive,
            out,
            label,
        } => {
            let engines = Engines::from_env(&config);
            let result =
                commands::cmd_separate(&engines, &config, &archive, &out, label.as_deref()).await;
            engines.shutdown();
            result.map(|_| ())
        }
        Commands::Inspect { file } => commands::cmd_inspect(&file).map(|_| ()),
        Commands::Batches { limit } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_batches(&db, limit)
        }
        Commands::Reports { case_id } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_reports(&db, case_id.as_deref())
        }
        Commands::Status => {
            let engines = Engines::from_env(&config);
            commands::cmd_status(&cli.db, &engines, &config).await
        }
    }
}
