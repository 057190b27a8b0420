//! Record repository
//!
//! The pipeline never stores anything itself. Callers hand finished batches
//! and reports to a `RecordRepository`, either the SQLite [`Database`] or the
//! in-process [`MemoryRepository`].

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{ExtractionBatch, Report, StoredBatch, TransactionRecord};

/// Case envelope and artifact location stored alongside a batch
#[derive(Debug, Clone, Default)]
pub struct BatchMetadata {
    pub case_id: Option<String>,
    pub case_title: Option<String>,
    pub evidence_id: Option<String>,
    pub artifact_url: Option<String>,
}

pub trait RecordRepository: Send + Sync {
    /// Store a batch and its records; returns the batch id
    fn insert_batch(&self, metadata: &BatchMetadata, batch: &ExtractionBatch) -> Result<i64>;

    /// Most recent batches first
    fn list_batches(&self, limit: usize) -> Result<Vec<StoredBatch>>;

    /// Records of one batch in their original order
    fn batch_records(&self, batch_id: i64) -> Result<Vec<TransactionRecord>>;

    /// Store a report; returns its id
    fn insert_report(&self, report: &Report) -> Result<i64>;

    /// Most recent reports first, optionally for one case
    fn list_reports(&self, case_id: Option<&str>) -> Result<Vec<Report>>;

    fn get_report(&self, id: i64) -> Result<Option<Report>>;
}

impl RecordRepository for Database {
    fn insert_batch(&self, metadata: &BatchMetadata, batch: &ExtractionBatch) -> Result<i64> {
        self.store_batch(metadata, batch)
    }

    fn list_batches(&self, limit: usize) -> Result<Vec<StoredBatch>> {
        self.recent_batches(limit)
    }

    fn batch_records(&self, batch_id: i64) -> Result<Vec<TransactionRecord>> {
        self.records_for_batch(batch_id)
    }

    fn insert_report(&self, report: &Report) -> Result<i64> {
        self.store_report(report)
    }

    fn list_reports(&self, case_id: Option<&str>) -> Result<Vec<Report>> {
        self.recent_reports(case_id)
    }

    fn get_report(&self, id: i64) -> Result<Option<Report>> {
        self.report_by_id(id)
    }
}

#[derive(Default)]
struct MemoryState {
    batches: Vec<(StoredBatch, Vec<TransactionRecord>)>,
    reports: Vec<Report>,
}

/// In-process repository; ids start at 1 and follow insertion order
#[derive(Default)]
pub struct MemoryRepository {
    state: RwLock<MemoryState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|_| Error::InvalidData("Repository lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|_| Error::InvalidData("Repository lock poisoned".into()))
    }
}

impl RecordRepository for MemoryRepository {
    fn insert_batch(&self, metadata: &BatchMetadata, batch: &ExtractionBatch) -> Result<i64> {
        let mut state = self.write()?;
        let id = state.batches.len() as i64 + 1;
        let stored = StoredBatch {
            id,
            case_id: metadata.case_id.clone(),
            case_title: metadata.case_title.clone(),
            evidence_id: metadata.evidence_id.clone(),
            archive_sha256: batch.archive_sha256.clone(),
            artifact_url: metadata.artifact_url.clone(),
            candidate_count: batch.candidate_count as i64,
            processed_count: batch.processed_count as i64,
            skipped_count: batch.skipped_count as i64,
            unreadable_count: batch.unreadable_count as i64,
            rejected_count: batch.rejected_count as i64,
            created_at: Utc::now(),
        };
        state.batches.push((stored, batch.records.clone()));
        Ok(id)
    }

    fn list_batches(&self, limit: usize) -> Result<Vec<StoredBatch>> {
        let state = self.read()?;
        Ok(state
            .batches
            .iter()
            .rev()
            .take(limit)
            .map(|(b, _)| b.clone())
            .collect())
    }

    fn batch_records(&self, batch_id: i64) -> Result<Vec<TransactionRecord>> {
        let state = self.read()?;
        state
            .batches
            .iter()
            .find(|(b, _)| b.id == batch_id)
            .map(|(_, records)| records.clone())
            .ok_or_else(|| Error::NotFound(format!("Batch {}", batch_id)))
    }

    fn insert_report(&self, report: &Report) -> Result<i64> {
        let mut state = self.write()?;
        let id = state.reports.len() as i64 + 1;
        let mut stored = report.clone();
        stored.id = Some(id);
        state.reports.push(stored);
        Ok(id)
    }

    fn list_reports(&self, case_id: Option<&str>) -> Result<Vec<Report>> {
        let state = self.read()?;
        Ok(state
            .reports
            .iter()
            .rev()
            .filter(|r| case_id.map_or(true, |c| r.case_id == c))
            .cloned()
            .collect())
    }

    fn get_report(&self, id: i64) -> Result<Option<Report>> {
        let state = self.read()?;
        Ok(state.reports.iter().find(|r| r.id == Some(id)).cloned())
    }
}
