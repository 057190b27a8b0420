//! Extraction batch storage

use rusqlite::{params, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{ExtractionBatch, StoredBatch, TransactionRecord};
use crate::repository::BatchMetadata;

const BATCH_COLUMNS: &str = "id, case_id, case_title, evidence_id, archive_sha256, artifact_url, \
     candidate_count, processed_count, skipped_count, unreadable_count, rejected_count, created_at";

fn batch_from_row(row: &Row<'_>) -> rusqlite::Result<StoredBatch> {
    let created_at: String = row.get(11)?;
    Ok(StoredBatch {
        id: row.get(0)?,
        case_id: row.get(1)?,
        case_title: row.get(2)?,
        evidence_id: row.get(3)?,
        archive_sha256: row.get(4)?,
        artifact_url: row.get(5)?,
        candidate_count: row.get(6)?,
        processed_count: row.get(7)?,
        skipped_count: row.get(8)?,
        unreadable_count: row.get(9)?,
        rejected_count: row.get(10)?,
        created_at: parse_datetime(&created_at),
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<TransactionRecord> {
    Ok(TransactionRecord {
        file: row.get(0)?,
        bank: row.get(1)?,
        sender_name: row.get(2)?,
        sender_bank: row.get(3)?,
        sender_acc: row.get(4)?,
        receiver_name: row.get(5)?,
        receiver_bank: row.get(6)?,
        receiver_acc: row.get(7)?,
        amount: row.get(8)?,
        date: row.get(9)?,
        qr_code_text: row.get(10)?,
    })
}

impl Database {
    /// Insert a batch and all of its records in one transaction
    pub fn store_batch(&self, metadata: &BatchMetadata, batch: &ExtractionBatch) -> Result<i64> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO extraction_batches (
                case_id, case_title, evidence_id, archive_sha256, artifact_url,
                candidate_count, processed_count, skipped_count, unreadable_count, rejected_count
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                metadata.case_id,
                metadata.case_title,
                metadata.evidence_id,
                batch.archive_sha256,
                metadata.artifact_url,
                batch.candidate_count as i64,
                batch.processed_count as i64,
                batch.skipped_count as i64,
                batch.unreadable_count as i64,
                batch.rejected_count as i64,
            ],
        )?;
        let batch_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO transaction_records (
                    batch_id, position, file, bank, sender_name, sender_bank, sender_acc,
                    receiver_name, receiver_bank, receiver_acc, amount, date, qr_code_text
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )?;
            for (position, r) in batch.records.iter().enumerate() {
                stmt.execute(params![
                    batch_id,
                    position as i64,
                    r.file,
                    r.bank,
                    r.sender_name,
                    r.sender_bank,
                    r.sender_acc,
                    r.receiver_name,
                    r.receiver_bank,
                    r.receiver_acc,
                    r.amount,
                    r.date,
                    r.qr_code_text,
                ])?;
            }
        }

        tx.commit()?;
        Ok(batch_id)
    }

    /// Most recent batches first
    pub fn recent_batches(&self, limit: usize) -> Result<Vec<StoredBatch>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM extraction_batches ORDER BY id DESC LIMIT ?",
            BATCH_COLUMNS
        ))?;
        let batches = stmt
            .query_map(params![limit.min(i64::MAX as usize) as i64], batch_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(batches)
    }

    pub fn get_batch(&self, batch_id: i64) -> Result<Option<StoredBatch>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM extraction_batches WHERE id = ?",
            BATCH_COLUMNS
        ))?;
        let mut rows = stmt.query_map(params![batch_id], batch_from_row)?;
        Ok(rows.next().transpose()?)
    }

    /// Records of a batch in extraction order
    pub fn records_for_batch(&self, batch_id: i64) -> Result<Vec<TransactionRecord>> {
        if self.get_batch(batch_id)?.is_none() {
            return Err(Error::NotFound(format!("Batch {}", batch_id)));
        }

        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT file, bank, sender_name, sender_bank, sender_acc, receiver_name,
                   receiver_bank, receiver_acc, amount, date, qr_code_text
            FROM transaction_records
            WHERE batch_id = ?
            ORDER BY position
            "#,
        )?;
        let records = stmt
            .query_map(params![batch_id], record_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }
}
