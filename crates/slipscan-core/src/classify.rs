//! Bank format detection from OCR text
//!
//! An ordered cascade, first match wins. Banking apps that stamp their logo
//! at the top of the slip are recognized by the first OCR token; the rest
//! fall back to substring checks because their branding moves around.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::BankVariant;

/// Full Thai name of the Government Savings Bank
const GSB_FULL_NAME: &str = "ธนาคารออมสิน";

/// Kasikornbank name as printed on its slips
const KBANK_NAME: &str = "กสิกรไทย";

/// Short brand strings seen on K PLUS slips ("ake" survives when OCR drops
/// the first letter of the MAKE by KBank watermark)
const KBANK_BRAND_SUBSTRINGS: [&str; 3] = ["kbank", "k+", "ake"];

static GSB_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bgsb\b").expect("valid regex"));

/// Sender honorific + Thai name glyphs + "ธ.กสิกรไทย" suffix
static KBANK_SENDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:จาก|^)\s*[นสย]\.?\s*[\x{0E00}-\x{0E7F}\s\.]+ธ\.?กสิกรไทย").expect("valid regex")
});

/// Detect which bank issued a slip from its OCR text
///
/// Total and deterministic: any input yields exactly one variant.
pub fn detect_bank(text: &str) -> BankVariant {
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();
    let first = lower.split_whitespace().next().unwrap_or("");

    // SCB Easy prints "SCB" above everything else
    if first == "scb" {
        return BankVariant::Scb;
    }

    // Krungthai NEXT: "Krungthai" watermark leads the slip
    if first == "krungthai" {
        return BankVariant::Ktb;
    }

    if GSB_TOKEN.is_match(&lower) || lower.contains(GSB_FULL_NAME) {
        return BankVariant::Gsb;
    }

    if KBANK_SENDER.is_match(trimmed)
        || lower.contains(KBANK_NAME)
        || KBANK_BRAND_SUBSTRINGS.iter().any(|s| lower.contains(s))
    {
        return BankVariant::Kbank;
    }

    // Bangkok Bank: "Bangkok Bank" header
    if first == "bangkok" {
        return BankVariant::Bbl;
    }

    BankVariant::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_scb_first_token() {
        let text = "SCB โอนเงินสำเร็จ 16 มิ.ย. 68 - 19:26 รหัสอ้างอิง: 2025061619";
        assert_eq!(detect_bank(text), BankVariant::Scb);
    }

    #[test]
    fn test_first_token_beats_substring_rules() {
        // KBANK indicators later in the text must not override SCB branding
        let text = "scb โอนเงินสำเร็จ ไปยัง นาย สมชาย ใจดี ธ.กสิกรไทย kbank";
        assert_eq!(detect_bank(text), BankVariant::Scb);
    }

    #[test]
    fn test_detect_krungthai() {
        let text = "Krungthai กรุงไทย โอนเงินสำเร็จ";
        assert_eq!(detect_bank(text), BankVariant::Ktb);
    }

    #[test]
    fn test_detect_gsb_token_and_name() {
        assert_eq!(detect_bank("MyMo GSB โอนเงินสำเร็จ"), BankVariant::Gsb);
        assert_eq!(
            detect_bank("โอนเงินสำเร็จ จาก นาย ก ธนาคารออมสิน"),
            BankVariant::Gsb
        );
        // "gsb" inside a longer word is not a standalone token
        assert_ne!(detect_bank("xgsbx receipt"), BankVariant::Gsb);
    }

    #[test]
    fn test_detect_kbank_variants() {
        assert_eq!(
            detect_bank("โอนเงินสำเร็จ จาก น.ส. สมหญิง รักดี ธ.กสิกรไทย"),
            BankVariant::Kbank
        );
        assert_eq!(detect_bank("ธนาคารกสิกรไทย"), BankVariant::Kbank);
        assert_eq!(detect_bank("K+ โอนเงินสำเร็จ"), BankVariant::Kbank);
        assert_eq!(detect_bank("transfer via KBank"), BankVariant::Kbank);
        assert_eq!(detect_bank("ake by kbank"), BankVariant::Kbank);
    }

    #[test]
    fn test_detect_bangkok_bank() {
        let text = "Bangkok Bank รายการสำเร็จ จำนวนเงิน 500.00";
        assert_eq!(detect_bank(text), BankVariant::Bbl);
    }

    #[test]
    fn test_detect_unknown_and_empty() {
        assert_eq!(detect_bank(""), BankVariant::Unknown);
        assert_eq!(detect_bank("   \n  "), BankVariant::Unknown);
        assert_eq!(detect_bank("random photo of a cat"), BankVariant::Unknown);
    }

    #[test]
    fn test_detect_is_idempotent() {
        let samples = [
            "SCB โอนเงินสำเร็จ",
            "ธนาคารออมสิน",
            "K+",
            "Bangkok Bank",
            "nothing here",
        ];
        for sample in samples {
            let first = detect_bank(sample);
            for _ in 0..3 {
                assert_eq!(detect_bank(sample), first);
            }
        }
    }
}
