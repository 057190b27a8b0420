//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (open_db, load_config)
//! - `extract` - Archive extraction into an artifact and a stored batch
//! - `report` - Report generation from an artifact
//! - `separate` - Image separation by classifier label
//! - `inspect` - Offline classification of OCR text
//! - `status` - Status, batch and report listings

pub mod core;
pub mod extract;
pub mod inspect;
pub mod report;
pub mod separate;
pub mod status;

// Re-export command functions for main.rs
pub use self::core::*;
pub use extract::*;
pub use inspect::*;
pub use report::*;
pub use separate::*;
pub use status::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
