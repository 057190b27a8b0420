//! Bangkok Bank (Bualuang mBanking) slips
//!
//! Accounts print as "123-4-x5678": three branch digits, a type digit,
//! then a partly masked tail.

use std::sync::LazyLock;

use regex::Regex;

use super::patterns::{capture, AMOUNT_LABELLED, HONORIFIC};
use super::SlipFields;

const SENDER_BANK: &str = "กรุงเทพ";
const PROMPTPAY: &str = "พร้อมเพย์";

static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)รายการสำเร็จ(.*?)จำนวนเงิน").expect("valid regex"));

static SENDER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"จาก\s+({})\s*(\p{{Thai}}+)", HONORIFIC)).expect("valid regex")
});

static SENDER_ACC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"จาก.*?(\d{3}-\d(?:[\s\-]?[x\d]{3,6}))").expect("valid regex")
});

static RECEIVER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"ไปที่\s*({})?\s*([\p{{Thai}}\s]+?)\s+\d{{3}}", HONORIFIC))
        .expect("valid regex")
});

static RECEIVER_ACC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ไปที่.*?(\d{3}-\d(?:[\s\-]?x{1,3}){0,2}[\s\-]?\d{2,4})").expect("valid regex")
});

static RECEIVER_BANK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ไปที่.*?(ธนาคาร\p{Thai}+)").expect("valid regex"));

pub(super) fn extract(text: &str) -> SlipFields {
    let lower = text.to_lowercase();

    let sender_name = SENDER_NAME
        .captures(text)
        .map(|caps| format!("{} {}", &caps[1], &caps[2]));

    let receiver_name = RECEIVER_NAME.captures(text).map(|caps| {
        [caps.get(1), caps.get(2)]
            .iter()
            .flatten()
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    });

    let receiver_bank = capture(&RECEIVER_BANK, text, 1)
        .or_else(|| text.contains(PROMPTPAY).then(|| PROMPTPAY.to_string()));

    SlipFields {
        date: capture(&DATE, text, 1),
        sender_name,
        sender_bank: Some(SENDER_BANK.to_string()),
        sender_acc: capture(&SENDER_ACC, &lower, 1),
        receiver_name,
        receiver_bank,
        receiver_acc: capture(&RECEIVER_ACC, &lower, 1),
        amount: capture(&AMOUNT_LABELLED, text, 1),
    }
}
