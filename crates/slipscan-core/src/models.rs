//! Domain models for slipscan

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed value for any record field extraction could not populate
pub const PLACEHOLDER: &str = "not found";

/// Column order of the exported table, one per `TransactionRecord` field
pub const RECORD_COLUMNS: [&str; 11] = [
    "file",
    "bank",
    "sender_name",
    "sender_bank",
    "sender_acc",
    "receiver_name",
    "receiver_bank",
    "receiver_acc",
    "amount",
    "date",
    "qr_code_text",
];

/// Receipt layouts the extractor knows how to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BankVariant {
    /// Siam Commercial Bank
    Scb,
    /// Krungthai Bank
    Ktb,
    /// Government Savings Bank
    Gsb,
    /// Kasikornbank
    Kbank,
    /// Bangkok Bank
    Bbl,
    Unknown,
}

impl BankVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scb => "SCB",
            Self::Ktb => "KTB",
            Self::Gsb => "GSB",
            Self::Kbank => "KBANK",
            Self::Bbl => "BBL",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Every variant, recognized banks first
    pub fn all() -> &'static [BankVariant] {
        &[
            Self::Scb,
            Self::Ktb,
            Self::Gsb,
            Self::Kbank,
            Self::Bbl,
            Self::Unknown,
        ]
    }
}

impl std::str::FromStr for BankVariant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scb" => Ok(Self::Scb),
            "ktb" | "krungthai" => Ok(Self::Ktb),
            "gsb" => Ok(Self::Gsb),
            "kbank" | "kasikorn" | "kasikornbank" => Ok(Self::Kbank),
            "bbl" | "bangkok" => Ok(Self::Bbl),
            "unknown" => Ok(Self::Unknown),
            _ => Err(format!("Unknown bank variant: {}", s)),
        }
    }
}

impl std::fmt::Display for BankVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output of the image classification capability for one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: String,
    /// In [0, 1]
    pub confidence: f64,
}

impl ClassificationResult {
    /// Case-sensitive label match against a configured token
    pub fn is(&self, token: &str) -> bool {
        self.label == token
    }
}

/// Per-file classification, as reported by image separation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileClassification {
    pub filename: String,
    pub label: String,
    pub confidence: f64,
}

/// Transaction data recovered from one slip image
///
/// Every field holds either a real value or [`PLACEHOLDER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub file: String,
    pub bank: String,
    pub sender_name: String,
    pub sender_bank: String,
    pub sender_acc: String,
    pub receiver_name: String,
    pub receiver_bank: String,
    pub receiver_acc: String,
    pub amount: String,
    pub date: String,
    pub qr_code_text: String,
}

impl TransactionRecord {
    /// A record carrying nothing but its file name and bank tag
    pub fn placeholder(file: &str, bank: BankVariant) -> Self {
        Self {
            file: or_placeholder(file),
            bank: bank.as_str().to_string(),
            sender_name: PLACEHOLDER.to_string(),
            sender_bank: PLACEHOLDER.to_string(),
            sender_acc: PLACEHOLDER.to_string(),
            receiver_name: PLACEHOLDER.to_string(),
            receiver_bank: PLACEHOLDER.to_string(),
            receiver_acc: PLACEHOLDER.to_string(),
            amount: PLACEHOLDER.to_string(),
            date: PLACEHOLDER.to_string(),
            qr_code_text: PLACEHOLDER.to_string(),
        }
    }

    /// Fields in [`RECORD_COLUMNS`] order
    pub fn fields(&self) -> [&str; 11] {
        [
            self.file.as_str(),
            self.bank.as_str(),
            self.sender_name.as_str(),
            self.sender_bank.as_str(),
            self.sender_acc.as_str(),
            self.receiver_name.as_str(),
            self.receiver_bank.as_str(),
            self.receiver_acc.as_str(),
            self.amount.as_str(),
            self.date.as_str(),
            self.qr_code_text.as_str(),
        ]
    }

    /// Build from values in [`RECORD_COLUMNS`] order
    ///
    /// Missing or empty values become the placeholder.
    pub fn from_fields<S: AsRef<str>>(values: &[S]) -> Self {
        let value = |i: usize| values.get(i).map(AsRef::as_ref).unwrap_or("");
        let get = |i: usize| or_placeholder(value(i));
        Self {
            file: get(0),
            bank: get(1),
            sender_name: get(2),
            sender_bank: get(3),
            sender_acc: get(4),
            receiver_name: get(5),
            receiver_bank: get(6),
            receiver_acc: get(7),
            amount: get(8),
            date: get(9),
            qr_code_text: exact_or_placeholder(value(10)),
        }
    }

    /// Number of fields (excluding file and bank) holding a real value
    pub fn populated_fields(&self) -> usize {
        self.fields()[2..]
            .iter()
            .filter(|v| **v != PLACEHOLDER)
            .count()
    }
}

/// Untouched value, or the placeholder when it is blank
///
/// QR payloads go through this: whitespace in a code is part of the code.
pub fn exact_or_placeholder(value: &str) -> String {
    if value.trim().is_empty() {
        PLACEHOLDER.to_string()
    } else {
        value.to_string()
    }
}

/// Trimmed value, or the placeholder when nothing is left
pub fn or_placeholder(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        value.to_string()
    }
}

/// Records and counters produced by one pass over an archive
///
/// `processed_count + skipped_count` always equals `candidate_count`.
/// `unreadable_count` is a subset of processed, `rejected_count` a subset of skipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionBatch {
    pub records: Vec<TransactionRecord>,
    pub candidate_count: usize,
    pub processed_count: usize,
    pub skipped_count: usize,
    pub unreadable_count: usize,
    pub rejected_count: usize,
    /// SHA-256 of the source archive, hex encoded
    pub archive_sha256: String,
}

impl ExtractionBatch {
    pub fn is_balanced(&self) -> bool {
        self.processed_count + self.skipped_count == self.candidate_count
    }
}

/// A batch persisted in the record repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredBatch {
    pub id: i64,
    pub case_id: Option<String>,
    pub case_title: Option<String>,
    pub evidence_id: Option<String>,
    pub archive_sha256: String,
    pub artifact_url: Option<String>,
    pub candidate_count: i64,
    pub processed_count: i64,
    pub skipped_count: i64,
    pub unreadable_count: i64,
    pub rejected_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Report flavours available from an exported artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Summary,
    InDepthAnalysis,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::InDepthAnalysis => "in_depth_analysis",
        }
    }
}

impl std::str::FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "summary" => Ok(Self::Summary),
            "in_depth_analysis" | "in_depth" | "indepth" => Ok(Self::InDepthAnalysis),
            _ => Err(format!(
                "Unknown report type: {}. Available: summary, in_depth_analysis",
                s
            )),
        }
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Headline statistics over a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Rows in the raw table, whether or not they normalized
    pub rows_total: usize,
    pub rows_without_amount: usize,
    pub rows_without_date: usize,
    /// Rows with a usable amount
    pub total_transactions: usize,
    pub total_amount: f64,
    pub average_amount: Option<f64>,
    pub unique_senders: usize,
    pub unique_receivers: usize,
    /// YYYY-MM-DD
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Sum and count for one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountAggregate {
    pub account: String,
    pub total_amount: f64,
    pub transaction_count: usize,
}

/// Per-account breakdown, each list sorted by account ascending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportInDepth {
    pub analysis_by_receiver: Vec<AccountAggregate>,
    pub analysis_by_sender: Vec<AccountAggregate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportContent {
    Summary(ReportSummary),
    InDepth(ReportInDepth),
}

/// A generated report with its case envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Assigned by the repository; `None` until stored
    pub id: Option<i64>,
    pub case_id: String,
    pub case_title: String,
    pub report_type: ReportType,
    pub description: String,
    pub content: ReportContent,
    pub created_at: DateTime<Utc>,
}
