//! Per-bank field extraction
//!
//! Each bank has its own strategy module with the same shape:
//! `fn extract(text: &str) -> SlipFields`. Strategies are total; a pattern
//! that does not match leaves its field empty, and empty fields become the
//! placeholder when the record is built. Adding a bank means adding a
//! variant and a module, never branching inside an existing strategy.

mod bbl;
mod gsb;
mod kbank;
mod ktb;
pub(crate) mod patterns;
mod scb;

use tracing::{debug, warn};

use crate::models::{exact_or_placeholder, or_placeholder, BankVariant, TransactionRecord};

/// Fields a bank strategy recovered from OCR text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlipFields {
    pub sender_name: Option<String>,
    pub sender_bank: Option<String>,
    pub sender_acc: Option<String>,
    pub receiver_name: Option<String>,
    pub receiver_bank: Option<String>,
    pub receiver_acc: Option<String>,
    pub amount: Option<String>,
    pub date: Option<String>,
}

impl SlipFields {
    /// How many fields were recovered
    pub fn hits(&self) -> usize {
        [
            &self.sender_name,
            &self.sender_bank,
            &self.sender_acc,
            &self.receiver_name,
            &self.receiver_bank,
            &self.receiver_acc,
            &self.amount,
            &self.date,
        ]
        .iter()
        .filter(|f| f.is_some())
        .count()
    }

    /// Build the full record, filling every gap with the placeholder
    pub fn into_record(self, file: &str, bank: BankVariant, qr_code_text: &str) -> TransactionRecord {
        let fill = |v: Option<String>| or_placeholder(v.as_deref().unwrap_or(""));
        TransactionRecord {
            file: or_placeholder(file),
            bank: bank.as_str().to_string(),
            sender_name: fill(self.sender_name),
            sender_bank: fill(self.sender_bank),
            sender_acc: fill(self.sender_acc),
            receiver_name: fill(self.receiver_name),
            receiver_bank: fill(self.receiver_bank),
            receiver_acc: fill(self.receiver_acc),
            amount: fill(self.amount),
            date: fill(self.date),
            qr_code_text: exact_or_placeholder(qr_code_text),
        }
    }
}

/// Run the strategy for `bank` over OCR text
pub fn extract_fields(bank: BankVariant, text: &str) -> SlipFields {
    match bank {
        BankVariant::Scb => scb::extract(text),
        BankVariant::Ktb => ktb::extract(text),
        BankVariant::Gsb => gsb::extract(text),
        BankVariant::Kbank => kbank::extract(text),
        BankVariant::Bbl => bbl::extract(text),
        BankVariant::Unknown => SlipFields::default(),
    }
}

/// Extract a full record for one slip image
///
/// `qr_code_text` is stored for every bank, including unknown layouts.
pub fn extract_record(
    bank: BankVariant,
    text: &str,
    file: &str,
    qr_code_text: &str,
) -> TransactionRecord {
    if bank == BankVariant::Unknown {
        warn!(file = %file, "Bank layout not recognized, emitting placeholder record");
    }

    let fields = extract_fields(bank, text);
    debug!(file = %file, bank = %bank, hits = fields.hits(), "Extracted slip fields");

    fields.into_record(file, bank, qr_code_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PLACEHOLDER;
    use crate::qr;

    #[test]
    fn test_unknown_bank_yields_placeholders_with_qr() {
        let record = extract_record(
            BankVariant::Unknown,
            "some unrelated text จำนวนเงิน 100.00",
            "cat.jpg",
            "00020101021129370016A000000677010111",
        );

        assert_eq!(record.file, "cat.jpg");
        assert_eq!(record.bank, "UNKNOWN");
        assert_eq!(record.amount, PLACEHOLDER);
        assert_eq!(record.populated_fields(), 1);
        assert_eq!(record.qr_code_text, "00020101021129370016A000000677010111");
    }

    #[test]
    fn test_every_field_populated_for_every_bank() {
        for bank in BankVariant::all() {
            let record = extract_record(*bank, "", "x.png", qr::IMAGE_UNAVAILABLE);
            assert!(record.fields().iter().all(|f| !f.is_empty()));
            assert_eq!(record.qr_code_text, qr::IMAGE_UNAVAILABLE);
        }
    }

    #[test]
    fn test_partial_match_keeps_other_fields() {
        let fields = extract_fields(BankVariant::Scb, "SCB จาก นาย สมชาย ใจดี");
        assert_eq!(fields.hits(), 2);

        let record = fields.into_record("a.png", BankVariant::Scb, "payload");
        assert_eq!(record.sender_name, "นาย สมชาย ใจดี");
        assert_eq!(record.sender_bank, "ไทยพาณิชย์");
        assert_eq!(record.receiver_name, PLACEHOLDER);
        assert_eq!(record.amount, PLACEHOLDER);
    }

    #[test]
    fn test_qr_payload_kept_byte_exact() {
        let record = extract_record(BankVariant::Scb, "SCB", "a.png", "  0002010102 \t");
        assert_eq!(record.qr_code_text, "  0002010102 \t");

        let blank = extract_record(BankVariant::Scb, "SCB", "a.png", " \n ");
        assert_eq!(blank.qr_code_text, PLACEHOLDER);
    }
}
