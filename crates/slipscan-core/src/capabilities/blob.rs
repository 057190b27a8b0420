//! Filesystem blob store for exported artifacts

use std::fs;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::BlobStore;

/// Stores blobs under a root directory and hands out `file://` URLs
///
/// `get` also accepts plain paths and `http(s)://` URLs so reports can be
/// built from artifacts stored elsewhere.
#[derive(Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    http_client: Client,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            http_client: Client::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if path.is_empty() || escapes {
            return Err(Error::InvalidData(format!(
                "Blob path must be relative and stay inside the store: {}",
                path
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn put(&self, bytes: &[u8], path: &str, content_type: &str) -> Result<String> {
        let dest = self.resolve(path)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, bytes)?;

        let absolute = dest.canonicalize()?;
        info!("Stored {} ({}, {} bytes)", absolute.display(), content_type, bytes.len());
        Ok(format!("file://{}", absolute.display()))
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        if url.starts_with("http://") || url.starts_with("https://") {
            debug!("Fetching remote blob {}", url);
            let response = self.http_client.get(url).send().await?.error_for_status()?;
            return Ok(response.bytes().await?.to_vec());
        }

        let path = url.strip_prefix("file://").unwrap_or(url);
        fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(format!("Blob not found: {}", path)),
            _ => Error::Io(e),
        })
    }
}
