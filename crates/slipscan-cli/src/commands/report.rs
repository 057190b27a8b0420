//! Report generation command

use anyhow::{Context, Result};
use slipscan_core::capabilities::LocalBlobStore;
use slipscan_core::models::{Report, ReportContent, ReportType};
use slipscan_core::reports::{generate_from_url, ReportOptions};
use slipscan_core::{Database, RecordRepository};

use super::truncate;

/// Build a report from an artifact, store it, and print it; returns the report id
pub async fn cmd_report(
    db: &Database,
    artifact: &str,
    report_type: &str,
    case_id: Option<&str>,
    case_title: Option<&str>,
    json: bool,
) -> Result<i64> {
    let report_type: ReportType = report_type.parse().map_err(anyhow::Error::msg)?;

    // Artifacts are addressed by URL or path, so the store root is unused
    let store = LocalBlobStore::new(".");
    let options = ReportOptions {
        case_id: case_id.map(str::to_string),
        case_title: case_title.map(str::to_string),
    };
    let mut report = generate_from_url(&store, artifact, report_type, &options)
        .await
        .with_context(|| format!("Failed to build report from {}", artifact))?;

    let id = db.insert_report(&report)?;
    report.id = Some(id);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(id)
}

pub fn print_report(report: &Report) {
    println!();
    println!("📈 {} (report #{})", report.description, report.id.unwrap_or_default());
    if !report.case_title.is_empty() {
        println!("   Case: {}", report.case_title);
    }
    println!("   ─────────────────────────────");

    match &report.content {
        ReportContent::Summary(s) => {
            println!("   Transactions:      {}", s.total_transactions);
            println!("   Total amount:      {:.2}", s.total_amount);
            match s.average_amount {
                Some(avg) => println!("   Average amount:    {:.2}", avg),
                None => println!("   Average amount:    -"),
            }
            println!("   Unique senders:    {}", s.unique_senders);
            println!("   Unique receivers:  {}", s.unique_receivers);
            match (&s.start_date, &s.end_date) {
                (Some(start), Some(end)) => println!("   Date range:        {} to {}", start, end),
                _ => println!("   Date range:        -"),
            }
            if s.rows_without_amount > 0 || s.rows_without_date > 0 {
                println!();
                println!(
                    "   ⚠️  {} of {} rows had no usable amount, {} no usable date",
                    s.rows_without_amount, s.rows_total, s.rows_without_date
                );
            }
        }
        ReportContent::InDepth(analysis) => {
            for (title, groups) in [
                ("By receiver", &analysis.analysis_by_receiver),
                ("By sender", &analysis.analysis_by_sender),
            ] {
                println!("   {}", title);
                if groups.is_empty() {
                    println!("     (no transactions with an amount)");
                }
                for group in groups {
                    println!(
                        "     {:<24} {:>14.2}  ({} tx)",
                        truncate(&group.account, 24),
                        group.total_amount,
                        group.transaction_count
                    );
                }
                println!();
            }
        }
    }
}
