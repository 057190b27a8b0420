//! Error types for slipscan
//!
//! Only batch-level failures are represented here. Image-level and
//! field-level misses never surface as errors: they are counted on the
//! batch or replaced by the placeholder value.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed archive: {0}")]
    Structural(String),

    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
