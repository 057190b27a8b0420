//! Pipeline configuration
//!
//! Config is loaded with a three-layer resolution:
//! 1. An explicit path, when given and present
//! 2. An override in the data dir (~/.local/share/slipscan/config/pipeline.toml)
//! 3. Embedded defaults (compiled into binary)
//!
//! Keys missing from a file keep their default value.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/pipeline.toml");

/// Which archive entries are slip candidates
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveConfig {
    /// Canonical top-level directory, with trailing slash
    pub slip_dir: String,
    /// Lowercase extensions without the dot
    pub extensions: Vec<String>,
    pub metadata_prefix: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            slip_dir: "Slip/".to_string(),
            extensions: vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()],
            metadata_prefix: "__MACOSX".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub archive: ArchiveConfig,
    /// Longest image side allowed before downscaling
    pub max_dimension: u32,
    pub ocr_languages: Vec<String>,
    /// Per-image OCR budget; expiry marks the image unreadable
    pub ocr_timeout: Duration,
    pub slip_label: String,
    pub prefilter: bool,
    /// Per-image classifier budget; expiry rejects the image
    pub classifier_timeout: Duration,
    /// Provisioned engine instances (concurrent runs allowed)
    pub engine_instances: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            archive: ArchiveConfig::default(),
            max_dimension: 1600,
            ocr_languages: vec!["th".to_string(), "en".to_string()],
            ocr_timeout: Duration::from_secs(60),
            slip_label: "slip".to_string(),
            prefilter: false,
            classifier_timeout: Duration::from_secs(30),
            engine_instances: 1,
        }
    }
}

impl PipelineConfig {
    /// Load using the default resolution order
    pub fn load() -> Result<Self> {
        load_config(None)
    }

    /// Load from an explicit file, falling back like [`PipelineConfig::load`] if it is absent
    pub fn load_from(path: &Path) -> Result<Self> {
        load_config(Some(path))
    }

    /// Parse TOML content over the defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        parse_config(content)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("slipscan").join("config").join("pipeline.toml"))
}

fn load_config(override_path: Option<&Path>) -> Result<PipelineConfig> {
    let candidate = override_path
        .map(Path::to_path_buf)
        .filter(|p| p.exists())
        .or_else(|| default_config_path().filter(|p| p.exists()));

    let content = match candidate {
        Some(path) => fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?,
        None => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    archive: Option<RawArchive>,
    preprocess: Option<RawPreprocess>,
    ocr: Option<RawOcr>,
    classifier: Option<RawClassifier>,
    engines: Option<RawEngines>,
}

#[derive(Debug, Deserialize)]
struct RawArchive {
    slip_dir: Option<String>,
    extensions: Option<Vec<String>>,
    metadata_prefix: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPreprocess {
    max_dimension: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawOcr {
    languages: Option<Vec<String>>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawClassifier {
    slip_label: Option<String>,
    prefilter: Option<bool>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawEngines {
    instances: Option<usize>,
}

fn parse_config(content: &str) -> Result<PipelineConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = PipelineConfig::default();

    if let Some(archive) = raw.archive {
        if let Some(dir) = archive.slip_dir {
            let dir = dir.trim_matches('/');
            if dir.is_empty() {
                return Err(Error::Config("archive.slip_dir must not be empty".into()));
            }
            config.archive.slip_dir = format!("{}/", dir);
        }
        if let Some(extensions) = archive.extensions {
            config.archive.extensions = extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect();
        }
        if let Some(prefix) = archive.metadata_prefix {
            config.archive.metadata_prefix = prefix;
        }
    }

    if let Some(max) = raw.preprocess.and_then(|p| p.max_dimension) {
        if max == 0 {
            return Err(Error::Config("preprocess.max_dimension must be positive".into()));
        }
        config.max_dimension = max;
    }

    if let Some(ocr) = raw.ocr {
        if let Some(languages) = ocr.languages {
            config.ocr_languages = languages;
        }
        if let Some(timeout) = ocr.timeout_secs {
            config.ocr_timeout = Duration::from_secs(timeout);
        }
    }

    if let Some(classifier) = raw.classifier {
        if let Some(label) = classifier.slip_label {
            config.slip_label = label;
        }
        if let Some(prefilter) = classifier.prefilter {
            config.prefilter = prefilter;
        }
        if let Some(timeout) = classifier.timeout_secs {
            config.classifier_timeout = Duration::from_secs(timeout);
        }
    }

    if let Some(instances) = raw.engines.and_then(|e| e.instances) {
        config.engine_instances = instances.max(1);
    }

    Ok(config)
}
