//! Slipscan Core Library
//!
//! Turns archives of photographed Thai bank-transfer slips into structured
//! transaction records:
//! - Archive reading and candidate selection
//! - QR presence gate, image bounding, OCR with a time budget
//! - Bank detection and per-bank field extraction
//! - Tabular artifact export with a fixed metadata block
//! - Summary and per-account reports over an artifact
//! - Image separation by classifier label
//! - SQLite and in-memory record repositories

pub mod aggregator;
pub mod archive;
pub mod capabilities;
pub mod classify;
pub mod config;
pub mod db;
pub mod engines;
pub mod error;
pub mod export;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod pipeline;
pub mod preprocess;
pub mod qr;
pub mod reports;
pub mod repository;
pub mod separate;

pub use capabilities::{
    BlobStore, HttpImageClassifier, HttpOcrReader, ImageClassifier, LocalBlobStore,
    MockClassifier, MockOcrReader, MockQrDecoder, OcrReader, QrDecoder, RqrrDecoder,
};
pub use classify::detect_bank;
pub use config::{ArchiveConfig, PipelineConfig};
pub use db::Database;
pub use engines::{CapabilityStatus, Engines};
pub use error::{Error, Result};
pub use export::{read_artifact, write_artifact, ArtifactMetadata, HEADER_OFFSET};
pub use models::{BankVariant, ExtractionBatch, ReportType, TransactionRecord, PLACEHOLDER};
pub use pipeline::{RunOptions, SlipPipeline};
pub use reports::{generate_report, normalize_amount, normalize_thai_date, ReportOptions};
pub use repository::{BatchMetadata, MemoryRepository, RecordRepository};
pub use separate::{separate_archive, SeparateOptions, Separation};
