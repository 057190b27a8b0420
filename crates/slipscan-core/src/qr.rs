//! QR presence gate and payload reader
//!
//! One [`scan`] per image answers two questions: the gate decides whether
//! the image is worth OCR, the payload decides what text the record stores.

use tracing::debug;

use crate::capabilities::QrDecoder;

/// Stored when the image is missing or cannot be decoded
pub const IMAGE_UNAVAILABLE: &str = "image not available";

/// Stored when the image decodes but carries no QR code
pub const QR_NOT_FOUND: &str = "QR code not found";

/// One decode of one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrScan {
    /// No image, or the image could not be decoded
    Unreadable,
    /// Payloads of every code found, possibly none
    Codes(Vec<String>),
}

impl QrScan {
    /// Whether the image carries at least one QR code
    ///
    /// Decode failures count as "no code", so a corrupt image is skipped
    /// rather than failing the batch.
    pub fn has_code(&self) -> bool {
        matches!(self, Self::Codes(codes) if !codes.is_empty())
    }

    /// Payload of the first QR code, or one of the two sentinels
    pub fn payload(&self) -> String {
        match self {
            Self::Unreadable => IMAGE_UNAVAILABLE.to_string(),
            Self::Codes(codes) => match codes.first() {
                Some(payload) if !payload.trim().is_empty() => payload.clone(),
                _ => QR_NOT_FOUND.to_string(),
            },
        }
    }
}

/// Decode an image once
pub fn scan(decoder: &dyn QrDecoder, image: Option<&[u8]>) -> QrScan {
    let Some(image) = image.filter(|i| !i.is_empty()) else {
        return QrScan::Unreadable;
    };

    match decoder.decode(image) {
        Ok(codes) => QrScan::Codes(codes),
        Err(e) => {
            debug!("QR decode failed: {}", e);
            QrScan::Unreadable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::MockQrDecoder;

    fn decoder() -> MockQrDecoder {
        MockQrDecoder::new()
            .with_payload(b"slip", "0002010102")
            .with_payload(b"slip", "ignored second code")
            .with_unreadable(b"corrupt")
    }

    fn has_qr(decoder: &MockQrDecoder, image: &[u8]) -> bool {
        scan(decoder, Some(image)).has_code()
    }

    fn read_payload(decoder: &MockQrDecoder, image: Option<&[u8]>) -> String {
        scan(decoder, image).payload()
    }

    #[test]
    fn test_gate_fails_open_to_skip() {
        let decoder = decoder();
        assert!(has_qr(&decoder, b"slip"));
        assert!(!has_qr(&decoder, b"photo"));
        assert!(!has_qr(&decoder, b"corrupt"));
    }

    #[test]
    fn test_payload_sentinels_are_distinct() {
        let decoder = decoder();
        assert_eq!(read_payload(&decoder, Some(b"slip".as_slice())), "0002010102");
        assert_eq!(read_payload(&decoder, Some(b"photo".as_slice())), QR_NOT_FOUND);
        assert_eq!(read_payload(&decoder, Some(b"corrupt".as_slice())), IMAGE_UNAVAILABLE);
        assert_eq!(read_payload(&decoder, None), IMAGE_UNAVAILABLE);
        assert_ne!(QR_NOT_FOUND, IMAGE_UNAVAILABLE);
    }

    #[test]
    fn test_one_scan_answers_both_questions() {
        let decoder = MockQrDecoder::new().with_payload(b"slip", " 0002010102\n");
        let found = scan(&decoder, Some(b"slip".as_slice()));
        assert!(found.has_code());
        assert_eq!(found.payload(), " 0002010102\n");

        let empty = scan(&decoder, Some(b"photo".as_slice()));
        assert!(!empty.has_code());
        assert_eq!(empty.payload(), QR_NOT_FOUND);
        assert!(!scan(&decoder, None).has_code());
    }
}
