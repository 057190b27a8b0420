//! Reports over an exported artifact
//!
//! Supports:
//! - Summary: transaction count, total and mean amount, distinct accounts, date range
//! - In-depth analysis: sum and count grouped by receiver and by sender account
//!
//! Amounts and dates are normalized per row. A row whose amount does not
//! normalize is left out of every amount aggregate; a row whose date does not
//! normalize is left out of the date range only. Neither is dropped from the
//! artifact itself.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use tracing::{debug, info};

use crate::capabilities::BlobStore;
use crate::error::Result;
use crate::export::{read_table, ArtifactTable};
use crate::models::{
    AccountAggregate, Report, ReportContent, ReportInDepth, ReportSummary, ReportType,
    PLACEHOLDER,
};

/// Abbreviated Thai month names, January first
const THAI_MONTHS: [&str; 12] = [
    "ม.ค.", "ก.พ.", "มี.ค.", "เม.ย.", "พ.ค.", "มิ.ย.", "ก.ค.", "ส.ค.", "ก.ย.", "ต.ค.", "พ.ย.",
    "ธ.ค.",
];

/// Columns a report needs from the artifact
pub const REPORT_COLUMNS: [&str; 4] = ["sender_acc", "receiver_acc", "amount", "date"];

static THAI_DATE: LazyLock<Regex> = LazyLock::new(|| {
    let months = THAI_MONTHS
        .iter()
        .map(|m| regex::escape(m))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        r"^\s*(\d{{1,2}})\s+({})\s*(\d{{2}})\s*[,\-]?\s*(\d{{1,2}}):(\d{{2}})",
        months
    ))
    .expect("valid regex")
});

/// Parse `<day> <month abbr> <yy>, <HH:MM>` with a Buddhist-era year
///
/// `None` for anything else, including out-of-range days or times.
pub fn normalize_thai_date(value: &str) -> Option<NaiveDateTime> {
    let caps = THAI_DATE.captures(value)?;
    let day: u32 = caps[1].parse().ok()?;
    let month = THAI_MONTHS.iter().position(|m| *m == &caps[2])? as u32 + 1;
    let yy: i32 = caps[3].parse().ok()?;
    let hour: u32 = caps[4].parse().ok()?;
    let minute: u32 = caps[5].parse().ok()?;

    NaiveDate::from_ymd_opt(2500 + yy - 543, month, day)?.and_hms_opt(hour, minute, 0)
}

/// Strip thousands separators and parse; `None` unless finite
pub fn normalize_amount(value: &str) -> Option<f64> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// One artifact row as seen by the report engine
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub sender_acc: String,
    pub receiver_acc: String,
    /// Original amount text, kept even when it does not parse
    pub amount_raw: String,
    pub amount: Option<f64>,
    pub date: Option<NaiveDateTime>,
}

impl ReportRow {
    pub fn new(sender_acc: &str, receiver_acc: &str, amount: &str, date: &str) -> Self {
        Self {
            sender_acc: sender_acc.to_string(),
            receiver_acc: receiver_acc.to_string(),
            amount_raw: amount.to_string(),
            amount: normalize_amount(amount),
            date: normalize_thai_date(date),
        }
    }
}

/// Normalize every artifact row; the header must carry [`REPORT_COLUMNS`]
pub fn rows_from_table(table: &ArtifactTable) -> Result<Vec<ReportRow>> {
    let idx = table.require_columns(&REPORT_COLUMNS)?;
    let get = |row: &csv::StringRecord, i: usize| row.get(idx[i]).unwrap_or("").to_string();

    Ok(table
        .rows
        .iter()
        .map(|row| {
            ReportRow::new(
                &get(row, 0),
                &get(row, 1),
                &get(row, 2),
                &get(row, 3),
            )
        })
        .collect())
}

fn distinct_accounts<'a>(accounts: impl Iterator<Item = &'a str>) -> usize {
    accounts
        .filter(|a| !a.is_empty() && *a != PLACEHOLDER)
        .collect::<HashSet<_>>()
        .len()
}

pub fn generate_summary(rows: &[ReportRow]) -> ReportSummary {
    let amounts: Vec<f64> = rows.iter().filter_map(|r| r.amount).collect();
    let total_amount: f64 = amounts.iter().sum();
    let average_amount = if amounts.is_empty() {
        None
    } else {
        Some(total_amount / amounts.len() as f64)
    };

    let dates: Vec<NaiveDateTime> = rows.iter().filter_map(|r| r.date).collect();
    let fmt = |d: &NaiveDateTime| d.format("%Y-%m-%d").to_string();

    ReportSummary {
        rows_total: rows.len(),
        rows_without_amount: rows.len() - amounts.len(),
        rows_without_date: rows.len() - dates.len(),
        total_transactions: amounts.len(),
        total_amount,
        average_amount,
        unique_senders: distinct_accounts(rows.iter().map(|r| r.sender_acc.as_str())),
        unique_receivers: distinct_accounts(rows.iter().map(|r| r.receiver_acc.as_str())),
        start_date: dates.iter().min().map(fmt),
        end_date: dates.iter().max().map(fmt),
    }
}

fn group_by<'a>(
    rows: &'a [ReportRow],
    key: impl Fn(&'a ReportRow) -> &'a str,
) -> Vec<AccountAggregate> {
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for row in rows {
        if let Some(amount) = row.amount {
            let entry = groups.entry(key(row)).or_default();
            entry.0 += amount;
            entry.1 += 1;
        }
    }
    groups
        .into_iter()
        .map(|(account, (total_amount, transaction_count))| AccountAggregate {
            account: account.to_string(),
            total_amount,
            transaction_count,
        })
        .collect()
}

pub fn generate_in_depth(rows: &[ReportRow]) -> ReportInDepth {
    ReportInDepth {
        analysis_by_receiver: group_by(rows, |r| r.receiver_acc.as_str()),
        analysis_by_sender: group_by(rows, |r| r.sender_acc.as_str()),
    }
}

pub fn generate_report(rows: &[ReportRow], report_type: ReportType) -> ReportContent {
    match report_type {
        ReportType::Summary => ReportContent::Summary(generate_summary(rows)),
        ReportType::InDepthAnalysis => ReportContent::InDepth(generate_in_depth(rows)),
    }
}

/// Wrap content in its case envelope; the id is assigned on storage
pub fn build_report(
    case_id: &str,
    case_title: &str,
    report_type: ReportType,
    content: ReportContent,
) -> Report {
    let description = match report_type {
        ReportType::Summary => format!("Summary report for case {}", case_id),
        ReportType::InDepthAnalysis => format!("In-depth analysis for case {}", case_id),
    };
    Report {
        id: None,
        case_id: case_id.to_string(),
        case_title: case_title.to_string(),
        report_type,
        description,
        content,
        created_at: Utc::now(),
    }
}

/// Case overrides for a report; unset values come from the artifact
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub case_id: Option<String>,
    pub case_title: Option<String>,
}

/// Build a report from artifact bytes
pub fn report_from_bytes(
    bytes: &[u8],
    report_type: ReportType,
    options: &ReportOptions,
) -> Result<Report> {
    let table = read_table(bytes)?;
    let rows = rows_from_table(&table)?;
    debug!("Report input: {} rows", rows.len());

    let case_id = options
        .case_id
        .clone()
        .unwrap_or_else(|| table.metadata.case_id.clone());
    let case_title = options
        .case_title
        .clone()
        .unwrap_or_else(|| table.metadata.case_title.clone());

    let content = generate_report(&rows, report_type);
    info!(case_id = %case_id, report_type = %report_type, "Report generated");
    Ok(build_report(&case_id, &case_title, report_type, content))
}

/// Fetch an artifact by URL and build a report from it
pub async fn generate_from_url(
    store: &dyn BlobStore,
    artifact_url: &str,
    report_type: ReportType,
    options: &ReportOptions,
) -> Result<Report> {
    let bytes = store.get(artifact_url).await?;
    report_from_bytes(&bytes, report_type, options)
}
