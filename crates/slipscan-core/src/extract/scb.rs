//! Siam Commercial Bank (SCB Easy) slips
//!
//! Layout: "โอนเงินสำเร็จ <date> รหัสอ้างอิง ... จาก <sender> <acct>
//! ไปยัง <receiver> <acct> จำนวนเงิน <amount>". The receiving bank is not
//! printed.

use std::sync::LazyLock;

use regex::Regex;

use super::patterns::{capture, AMOUNT_LABELLED, MASKED_ACCOUNT};
use super::SlipFields;

const SENDER_BANK: &str = "ไทยพาณิชย์";

static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)โอนเงินสำเร็จ(.*?)รหัสอ้างอิง").expect("valid regex"));

static SENDER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"จาก\s*(\p{Thai}+\s\p{Thai}+\s?\p{Thai}+)").expect("valid regex")
});

static SENDER_ACC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("({})", MASKED_ACCOUNT)).expect("valid regex"));

static RECEIVER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ไปยัง\s*((?:[นสย]\.?\s*)?[\p{Thai}\.]+(?:\s+\p{Thai}+)*)").expect("valid regex")
});

static RECEIVER_ACC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("ไปยัง.*?({})", MASKED_ACCOUNT)).expect("valid regex")
});

pub(super) fn extract(text: &str) -> SlipFields {
    let lower = text.to_lowercase();

    SlipFields {
        date: capture(&DATE, text, 1),
        sender_name: capture(&SENDER_NAME, text, 1),
        sender_bank: Some(SENDER_BANK.to_string()),
        sender_acc: capture(&SENDER_ACC, &lower, 1),
        receiver_name: capture(&RECEIVER_NAME, text, 1),
        receiver_bank: None,
        receiver_acc: capture(&RECEIVER_ACC, &lower, 1),
        amount: capture(&AMOUNT_LABELLED, text, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIP: &str = "SCB โอนเงินสำเร็จ 16 มิ.ย. 68, 19:26 รหัสอ้างอิง: 202506161926ABC \
        จาก นาย สมชาย ใจดี xxx-xxx123-4 ไปยัง น.ส. สมหญิง รักดี xxx-xxx567-8 \
        จำนวนเงิน 1,500.00";

    #[test]
    fn test_extract_full_slip() {
        let fields = extract(SLIP);
        assert_eq!(fields.date.as_deref(), Some("16 มิ.ย. 68, 19:26"));
        assert_eq!(fields.sender_name.as_deref(), Some("นาย สมชาย ใจดี"));
        assert_eq!(fields.sender_bank.as_deref(), Some("ไทยพาณิชย์"));
        assert_eq!(fields.sender_acc.as_deref(), Some("xxx-xxx123-4"));
        assert_eq!(fields.receiver_name.as_deref(), Some("น.ส. สมหญิง รักดี"));
        assert_eq!(fields.receiver_bank, None);
        assert_eq!(fields.receiver_acc.as_deref(), Some("xxx-xxx567-8"));
        assert_eq!(fields.amount.as_deref(), Some("1,500.00"));
    }

    #[test]
    fn test_missing_anchors_leave_fields_empty() {
        let fields = extract("SCB จำนวนเงิน 99.50");
        assert_eq!(fields.amount.as_deref(), Some("99.50"));
        assert_eq!(fields.date, None);
        assert_eq!(fields.sender_name, None);
        assert_eq!(fields.receiver_acc, None);
    }
}
