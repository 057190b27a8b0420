//! Government Savings Bank (MyMo) slips
//!
//! Receivers are usually PromptPay targets ("พร้อมเพย์", or "พร้อมจ่าย"
//! after OCR), optionally prefixed with a top-up marker.

use std::sync::LazyLock;

use regex::Regex;

use super::patterns::{capture, AMOUNT_LABELLED, HONORIFIC};
use super::SlipFields;

const SENDER_BANK: &str = "ธนาคารออมสิน";

static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"รหัสอ้างอิง:\s+(\d{10,20}[^\w]?\d{5,20})\s+(\d{1,2}\s?\p{Thai}{1,5}\.\p{Thai}{1,5}\.\s\d{2,4}\s\d{2}:\d{2})",
    )
    .expect("valid regex")
});

static SENDER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"จาก\s+({}?[\p{{Thai}}\s]+?)\s+ธนาคารออมสิน", HONORIFIC))
        .expect("valid regex")
});

static SENDER_ACC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ธนาคารออมสิน\s+(\d{4}x{4,}\d+)").expect("valid regex"));

static RECEIVER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"ถึง\s+({}?[\p{{Thai}}\s\.]+?)\s+(?:เติมเงิน)?\s*(?:พร้อมเพย์|พร้อมจ่าย)",
        HONORIFIC
    ))
    .expect("valid regex")
});

static RECEIVER_BANK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:เติมเงิน)?\s*(?:พร้อมเพย์|พร้อมจ่าย)").expect("valid regex"));

static RECEIVER_ACC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:พร้อมเพย์|พร้อมจ่าย)[\s\w]*?(\d{4}x{4,}\d+)").expect("valid regex")
});

pub(super) fn extract(text: &str) -> SlipFields {
    let lower = text.to_lowercase();

    SlipFields {
        date: capture(&DATE, text, 2),
        sender_name: capture(&SENDER_NAME, text, 1),
        sender_bank: Some(SENDER_BANK.to_string()),
        sender_acc: capture(&SENDER_ACC, &lower, 1),
        receiver_name: capture(&RECEIVER_NAME, text, 1),
        receiver_bank: capture(&RECEIVER_BANK, text, 0),
        receiver_acc: capture(&RECEIVER_ACC, &lower, 1),
        amount: capture(&AMOUNT_LABELLED, text, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIP: &str = "MyMo GSB โอนเงินสำเร็จ รหัสอ้างอิง: 2025061619260001 16 มิ.ย. 2568 19:26 \
        จาก นาย สมชาย ใจดี ธนาคารออมสิน 0201xxxxxx1234 \
        ถึง นางสาว สมหญิง รักดี พร้อมเพย์ 0812XXXX5678 จำนวนเงิน 300.00 บาท";

    #[test]
    fn test_extract_full_slip() {
        let fields = extract(SLIP);
        assert_eq!(fields.date.as_deref(), Some("16 มิ.ย. 2568 19:26"));
        assert_eq!(fields.sender_name.as_deref(), Some("นาย สมชาย ใจดี"));
        assert_eq!(fields.sender_bank.as_deref(), Some("ธนาคารออมสิน"));
        assert_eq!(fields.sender_acc.as_deref(), Some("0201xxxxxx1234"));
        assert_eq!(fields.receiver_name.as_deref(), Some("นางสาว สมหญิง รักดี"));
        assert_eq!(fields.receiver_bank.as_deref(), Some("พร้อมเพย์"));
        assert_eq!(fields.receiver_acc.as_deref(), Some("0812xxxx5678"));
        assert_eq!(fields.amount.as_deref(), Some("300.00"));
    }

    #[test]
    fn test_top_up_receiver() {
        let fields = extract("GSB ถึง นาย ร้านค้า เติมเงินพร้อมจ่าย 0899xxxx1111");
        assert_eq!(fields.receiver_name.as_deref(), Some("นาย ร้านค้า"));
        assert_eq!(fields.receiver_bank.as_deref(), Some("เติมเงินพร้อมจ่าย"));
        assert_eq!(fields.receiver_acc.as_deref(), Some("0899xxxx1111"));
        assert_eq!(fields.sender_acc, None);
    }
}
