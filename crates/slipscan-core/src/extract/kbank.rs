//! Kasikornbank (K PLUS) slips
//!
//! K PLUS prints no "from"/"to" labels: sender and receiver are the first
//! and second occurrence of each name, bank, and account pattern.

use std::sync::LazyLock;

use regex::Regex;

use super::patterns::{capture, nth_match, MASKED_ACCOUNT_RE, PERSON_NAME};
use super::SlipFields;

const SENDER_BANK: &str = "ธนาคารกสิกรไทย";

static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)โอนเงินสำเร็จ(.*?น\.)").expect("valid regex"));

static BANK_ABBREV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ธ\.กสิกรไทย").expect("valid regex"));

static AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"จำนวน:\s*([\d,]+\.\d{2})").expect("valid regex"));

pub(super) fn extract(text: &str) -> SlipFields {
    let lower = text.to_lowercase();

    SlipFields {
        date: capture(&DATE, text, 1),
        sender_name: nth_match(&PERSON_NAME, text, 0),
        sender_bank: Some(SENDER_BANK.to_string()),
        sender_acc: nth_match(&MASKED_ACCOUNT_RE, &lower, 0),
        receiver_name: nth_match(&PERSON_NAME, text, 1),
        receiver_bank: nth_match(&BANK_ABBREV, text, 1),
        receiver_acc: nth_match(&MASKED_ACCOUNT_RE, &lower, 1),
        amount: capture(&AMOUNT, text, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIP: &str = "โอนเงินสำเร็จ 16 มิ.ย. 68 19:26 น. \
        นาย สมชาย ใจดี ธ.กสิกรไทย xxx-x-x1234-x \
        น.ส. สมหญิง รักดี ธ.กสิกรไทย xxx-x-x5678-x \
        เลขที่รายการ: 015167192600 จำนวน: 1,250.00 บาท ค่าธรรมเนียม: 0.00 บาท";

    #[test]
    fn test_extract_full_slip() {
        let fields = extract(SLIP);
        assert_eq!(fields.date.as_deref(), Some("16 มิ.ย. 68 19:26 น."));
        assert_eq!(fields.sender_name.as_deref(), Some("นาย สมชาย ใจดี"));
        assert_eq!(fields.sender_bank.as_deref(), Some("ธนาคารกสิกรไทย"));
        assert_eq!(fields.sender_acc.as_deref(), Some("xxx-x-x1234-x"));
        assert_eq!(fields.receiver_name.as_deref(), Some("น.ส. สมหญิง รักดี"));
        assert_eq!(fields.receiver_bank.as_deref(), Some("ธ.กสิกรไทย"));
        assert_eq!(fields.receiver_acc.as_deref(), Some("xxx-x-x5678-x"));
        assert_eq!(fields.amount.as_deref(), Some("1,250.00"));
    }

    #[test]
    fn test_single_party_leaves_receiver_empty() {
        let fields = extract("K+ นาย สมชาย ใจดี ธ.กสิกรไทย xxx-x-x1234-x");
        assert_eq!(fields.sender_name.as_deref(), Some("นาย สมชาย ใจดี"));
        assert_eq!(fields.receiver_name, None);
        assert_eq!(fields.receiver_bank, None);
        assert_eq!(fields.receiver_acc, None);
        assert_eq!(fields.amount, None);
    }
}
