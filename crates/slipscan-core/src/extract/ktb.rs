//! Krungthai (Krungthai NEXT) slips
//!
//! The sender block runs from "จาก" to "ไปยัง" and the receiver block from
//! "ไปยัง" to "จำนวน". Each block reads "<name> <bank> <masked acct>".

use std::sync::LazyLock;

use regex::Regex;

use super::patterns::{capture, segment, AMOUNT_LABELLED, HONORIFIC, MASKED_ACCOUNT_RE};
use super::SlipFields;

static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"วันที่ทำรายการ\s+(\d{1,2}\s\p{Thai}{1,5}\.\p{Thai}{1,5}\.\s\d{2,4}\s\d{2}:\d{2})")
        .expect("valid regex")
});

static SENDER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"จาก\s*({}?\s*\p{{Thai}}+(?:\s\p{{Thai}}+)?)", HONORIFIC))
        .expect("valid regex")
});

static RECEIVER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"ไปยัง\s*({}?\s*\p{{Thai}}+(?:\s\p{{Thai}}+)?)", HONORIFIC))
        .expect("valid regex")
});

/// Bank name printed just before the masked account
static BANK_BEFORE_ACCOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\p{Thai}+)\s+x{1,3}[\s\-]?").expect("valid regex"));

pub(super) fn extract(text: &str) -> SlipFields {
    let sender = segment(text, "จาก", "ไปยัง").to_lowercase();
    let receiver = segment(text, "ไปยัง", "จำนวน").to_lowercase();

    SlipFields {
        date: capture(&DATE, text, 1),
        sender_name: capture(&SENDER_NAME, &sender, 1),
        sender_bank: capture(&BANK_BEFORE_ACCOUNT, &sender, 1),
        sender_acc: capture(&MASKED_ACCOUNT_RE, &sender, 0),
        receiver_name: capture(&RECEIVER_NAME, &receiver, 1),
        receiver_bank: capture(&BANK_BEFORE_ACCOUNT, &receiver, 1),
        receiver_acc: capture(&MASKED_ACCOUNT_RE, &receiver, 0),
        amount: capture(&AMOUNT_LABELLED, text, 1),
    }
}
