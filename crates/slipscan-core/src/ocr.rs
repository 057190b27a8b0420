//! OCR text extraction with a per-image time budget

use std::time::Duration;

use tracing::warn;

use crate::capabilities::OcrReader;

/// What OCR produced for one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcrOutcome {
    /// Fragments joined with single spaces, in engine order
    Text(String),
    /// The engine found nothing
    Empty,
    Failed(String),
    TimedOut,
}

impl OcrOutcome {
    /// Text usable for classification, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Join engine fragments without reordering them
pub fn join_fragments(fragments: &[String]) -> String {
    fragments
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run OCR on one image, giving up after `budget`
///
/// Never fails: errors and timeouts are reported as outcomes so one stalled
/// image cannot block the batch.
pub async fn read_text(
    reader: &dyn OcrReader,
    image: &[u8],
    languages: &[String],
    budget: Duration,
) -> OcrOutcome {
    match tokio::time::timeout(budget, reader.read(image, languages)).await {
        Ok(Ok(fragments)) => {
            let text = join_fragments(&fragments);
            if text.is_empty() {
                OcrOutcome::Empty
            } else {
                OcrOutcome::Text(text)
            }
        }
        Ok(Err(e)) => {
            warn!("OCR failed: {}", e);
            OcrOutcome::Failed(e.to_string())
        }
        Err(_) => {
            warn!("OCR exceeded {:?}", budget);
            OcrOutcome::TimedOut
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::MockOcrReader;

    fn langs() -> Vec<String> {
        vec!["th".to_string(), "en".to_string()]
    }

    #[test]
    fn test_join_preserves_engine_order() {
        let fragments = vec![
            "จำนวนเงิน".to_string(),
            " ".to_string(),
            "SCB".to_string(),
            "1,500.00 ".to_string(),
        ];
        assert_eq!(join_fragments(&fragments), "จำนวนเงิน SCB 1,500.00");
    }

    #[tokio::test]
    async fn test_outcomes() {
        let reader = MockOcrReader::new()
            .with_text(b"slip", &["SCB", "โอนเงินสำเร็จ"])
            .with_failure(b"broken");
        let budget = Duration::from_secs(5);

        assert_eq!(
            read_text(&reader, b"slip", &langs(), budget).await,
            OcrOutcome::Text("SCB โอนเงินสำเร็จ".to_string())
        );
        assert_eq!(
            read_text(&reader, b"blank", &langs(), budget).await,
            OcrOutcome::Empty
        );
        assert!(matches!(
            read_text(&reader, b"broken", &langs(), budget).await,
            OcrOutcome::Failed(_)
        ));
    }

    #[tokio::test]
    async fn test_stalled_engine_times_out() {
        let reader = MockOcrReader::new().with_stall(b"slow", Duration::from_secs(30));
        let outcome = read_text(&reader, b"slow", &langs(), Duration::from_millis(50)).await;
        assert_eq!(outcome, OcrOutcome::TimedOut);
    }
}
