//! Per-run record accumulation and counting

use tracing::debug;

use crate::models::{ExtractionBatch, TransactionRecord};

/// Collects records and counters for one archive run
///
/// Every candidate ends up in exactly one of `record`, `record_unreadable`,
/// `skip`, or `reject`, which keeps the batch balanced.
#[derive(Debug)]
pub struct RecordAggregator {
    batch: ExtractionBatch,
}

impl RecordAggregator {
    pub fn new(candidate_count: usize, archive_sha256: String) -> Self {
        Self {
            batch: ExtractionBatch {
                candidate_count,
                archive_sha256,
                ..Default::default()
            },
        }
    }

    /// A record extracted from readable text
    pub fn record(&mut self, record: TransactionRecord) {
        debug!(file = %record.file, bank = %record.bank, "Record added");
        self.batch.processed_count += 1;
        self.batch.records.push(record);
    }

    /// A processed image whose OCR yielded no usable text
    pub fn record_unreadable(&mut self, record: TransactionRecord) {
        self.batch.unreadable_count += 1;
        self.record(record);
    }

    /// An image without a QR code
    pub fn skip(&mut self, file: &str) {
        debug!(file = %file, "Skipped, no QR code");
        self.batch.skipped_count += 1;
    }

    /// An image the classifier labelled as something other than a slip
    pub fn reject(&mut self, file: &str) {
        debug!(file = %file, "Rejected by image classifier");
        self.batch.rejected_count += 1;
        self.batch.skipped_count += 1;
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.batch.records
    }

    pub fn finish(self) -> ExtractionBatch {
        self.batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BankVariant;

    #[test]
    fn test_counts_stay_balanced() {
        let mut agg = RecordAggregator::new(4, "abc".to_string());
        agg.record(TransactionRecord::placeholder("a.png", BankVariant::Scb));
        agg.record_unreadable(TransactionRecord::placeholder("b.png", BankVariant::Unknown));
        agg.skip("c.png");
        agg.reject("d.png");

        assert_eq!(agg.records().len(), 2);
        let batch = agg.finish();
        assert_eq!(batch.processed_count, 2);
        assert_eq!(batch.unreadable_count, 1);
        assert_eq!(batch.skipped_count, 2);
        assert_eq!(batch.rejected_count, 1);
        assert_eq!(batch.archive_sha256, "abc");
        assert!(batch.is_balanced());
    }

    #[test]
    fn test_records_keep_arrival_order() {
        let mut agg = RecordAggregator::new(3, String::new());
        for name in ["3.png", "1.png", "2.png"] {
            agg.record(TransactionRecord::placeholder(name, BankVariant::Gsb));
        }
        let files: Vec<_> = agg.finish().records.into_iter().map(|r| r.file).collect();
        assert_eq!(files, vec!["3.png", "1.png", "2.png"]);
    }
}
