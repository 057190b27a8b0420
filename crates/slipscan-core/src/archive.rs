//! Slip archive reading
//!
//! Uploads are zip files. Only entries under the slip directory with a
//! supported image extension are OCR candidates; platform metadata folders
//! (`__MACOSX/...`) never are.

use std::io::{Cursor, Read};
use std::path::Path;

use tracing::debug;
use zip::ZipArchive;

use crate::config::ArchiveConfig;
use crate::error::{Error, Result};

/// Image extensions accepted by image separation
pub const SEPARATION_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "bmp"];

/// Largest entry inflated into memory
pub const MAX_ENTRY_BYTES: u64 = 64 * 1024 * 1024;

/// One archive entry, held only while it is processed
#[derive(Debug, Clone)]
pub struct ImageAsset {
    /// Archive-relative path
    pub path: String,
    pub bytes: Vec<u8>,
}

impl ImageAsset {
    /// Base name, used as the record key
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

fn has_extension(path: &str, extensions: &[impl AsRef<str>]) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .is_some_and(|e| extensions.iter().any(|x| x.as_ref() == e))
}

fn in_metadata_dir(path: &str, metadata_prefix: &str) -> bool {
    path.split('/').any(|part| part.starts_with(metadata_prefix))
}

/// Whether an entry path is an OCR candidate
pub fn is_candidate(path: &str, config: &ArchiveConfig) -> bool {
    path.starts_with(&config.slip_dir)
        && !path.ends_with('/')
        && !in_metadata_dir(path, &config.metadata_prefix)
        && has_extension(path, config.extensions.as_slice())
}

/// Whether an entry path is an image for separation
pub fn is_separable_image(path: &str, metadata_prefix: &str) -> bool {
    !path.ends_with('/')
        && !in_metadata_dir(path, metadata_prefix)
        && has_extension(path, SEPARATION_EXTENSIONS.as_slice())
}

/// Read every file entry whose path passes `keep`, in archive order
///
/// Any failure to open the archive or inflate an entry is structural: the
/// caller must abandon the whole batch. So is an entry larger than
/// [`MAX_ENTRY_BYTES`], whether declared in its header or found on inflation.
pub fn read_entries(bytes: &[u8], keep: impl Fn(&str) -> bool) -> Result<Vec<ImageAsset>> {
    read_entries_within(bytes, MAX_ENTRY_BYTES, keep)
}

fn read_entries_within(
    bytes: &[u8],
    max_entry_bytes: u64,
    keep: impl Fn(&str) -> bool,
) -> Result<Vec<ImageAsset>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::Structural(format!("Cannot open archive: {}", e)))?;

    let mut assets = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| Error::Structural(format!("Cannot read entry {}: {}", i, e)))?;
        if entry.is_dir() || !keep(entry.name()) {
            continue;
        }

        let path = entry.name().to_string();
        let declared = entry.size();
        if declared > max_entry_bytes {
            return Err(Error::Structural(format!(
                "Entry {} declares {} bytes, limit is {}",
                path, declared, max_entry_bytes
            )));
        }

        // The header size is untrusted, so it is only a hint and the read is capped
        let mut data = Vec::with_capacity(declared as usize);
        entry
            .by_ref()
            .take(max_entry_bytes + 1)
            .read_to_end(&mut data)
            .map_err(|e| Error::Structural(format!("Cannot inflate {}: {}", path, e)))?;
        if data.len() as u64 > max_entry_bytes {
            return Err(Error::Structural(format!(
                "Entry {} inflates past {} bytes",
                path, max_entry_bytes
            )));
        }
        assets.push(ImageAsset { path, bytes: data });
    }

    debug!("Archive holds {} selected entries of {}", assets.len(), archive.len());
    Ok(assets)
}

/// Candidate slip images, in archive order
pub fn read_candidates(bytes: &[u8], config: &ArchiveConfig) -> Result<Vec<ImageAsset>> {
    read_entries(bytes, |path| is_candidate(path, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                writer.write_all(data.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_candidate_rules() {
        let config = ArchiveConfig::default();
        assert!(is_candidate("Slip/a.png", &config));
        assert!(is_candidate("Slip/nested/b.JPG", &config));
        assert!(is_candidate("Slip/c.jpeg", &config));
        assert!(!is_candidate("Slip/", &config));
        assert!(!is_candidate("Slip/d.gif", &config));
        assert!(!is_candidate("Other/e.png", &config));
        assert!(!is_candidate("slip/f.png", &config));
        assert!(!is_candidate("__MACOSX/Slip/._g.png", &config));
        assert!(!is_candidate("Slip/__MACOSX/h.png", &config));
    }

    #[test]
    fn test_read_candidates_in_archive_order() {
        let zip = build_zip(&[
            ("Slip/", ""),
            ("Slip/one.png", "1"),
            ("readme.txt", "x"),
            ("__MACOSX/Slip/._one.png", "meta"),
            ("Slip/two.JPG", "2"),
        ]);

        let assets = read_candidates(&zip, &ArchiveConfig::default()).unwrap();
        let names: Vec<_> = assets.iter().map(|a| a.file_name()).collect();
        assert_eq!(names, vec!["one.png", "two.JPG"]);
        assert_eq!(assets[1].bytes, b"2");
    }

    #[test]
    fn test_corrupt_archive_is_structural() {
        let err = read_candidates(b"PK\x03\x04 truncated", &ArchiveConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Structural(_)));
    }

    /// One stored entry whose zip64 extra field claims `claimed` uncompressed bytes
    fn zip64_with_size_claim(name: &str, data: &[u8], claimed: u64) -> Vec<u8> {
        let mut extra = Vec::new();
        extra.extend_from_slice(&1u16.to_le_bytes());
        extra.extend_from_slice(&16u16.to_le_bytes());
        extra.extend_from_slice(&claimed.to_le_bytes());
        extra.extend_from_slice(&(data.len() as u64).to_le_bytes());

        // Shared between the local and central headers: flags, method, time, date, crc
        let mut common = Vec::new();
        common.extend_from_slice(&0u16.to_le_bytes());
        common.extend_from_slice(&0u16.to_le_bytes());
        common.extend_from_slice(&0u16.to_le_bytes());
        common.extend_from_slice(&0x21u16.to_le_bytes());
        common.extend_from_slice(&0u32.to_le_bytes());
        common.extend_from_slice(&u32::MAX.to_le_bytes());
        common.extend_from_slice(&u32::MAX.to_le_bytes());
        common.extend_from_slice(&(name.len() as u16).to_le_bytes());
        common.extend_from_slice(&(extra.len() as u16).to_le_bytes());

        let mut zip = Vec::new();
        zip.extend_from_slice(&0x04034b50u32.to_le_bytes());
        zip.extend_from_slice(&45u16.to_le_bytes());
        zip.extend_from_slice(&common);
        zip.extend_from_slice(name.as_bytes());
        zip.extend_from_slice(&extra);
        zip.extend_from_slice(data);

        let central_offset = zip.len() as u32;
        zip.extend_from_slice(&0x02014b50u32.to_le_bytes());
        zip.extend_from_slice(&45u16.to_le_bytes());
        zip.extend_from_slice(&45u16.to_le_bytes());
        zip.extend_from_slice(&common);
        zip.extend_from_slice(&0u16.to_le_bytes()); // comment length
        zip.extend_from_slice(&0u16.to_le_bytes()); // disk number
        zip.extend_from_slice(&0u16.to_le_bytes()); // internal attributes
        zip.extend_from_slice(&0u32.to_le_bytes()); // external attributes
        zip.extend_from_slice(&0u32.to_le_bytes()); // local header offset
        zip.extend_from_slice(name.as_bytes());
        zip.extend_from_slice(&extra);
        let central_size = zip.len() as u32 - central_offset;

        zip.extend_from_slice(&0x06054b50u32.to_le_bytes());
        zip.extend_from_slice(&0u16.to_le_bytes());
        zip.extend_from_slice(&0u16.to_le_bytes());
        zip.extend_from_slice(&1u16.to_le_bytes());
        zip.extend_from_slice(&1u16.to_le_bytes());
        zip.extend_from_slice(&central_size.to_le_bytes());
        zip.extend_from_slice(&central_offset.to_le_bytes());
        zip.extend_from_slice(&0u16.to_le_bytes());
        zip
    }

    #[test]
    fn test_oversized_size_claim_is_structural() {
        for claimed in [1u64 << 63, isize::MAX as u64 - 1, MAX_ENTRY_BYTES + 1] {
            let zip = zip64_with_size_claim("Slip/a.png", b"slip", claimed);
            let err = read_candidates(&zip, &ArchiveConfig::default()).unwrap_err();
            assert!(matches!(err, Error::Structural(_)), "claim {}", claimed);
        }
    }

    #[test]
    fn test_entry_over_limit_is_structural() {
        let zip = build_zip(&[("Slip/a.png", "12345678"), ("Slip/b.png", "1234")]);
        let err = read_entries_within(&zip, 4, |_| true).unwrap_err();
        assert!(matches!(err, Error::Structural(_)));

        let assets = read_entries_within(&zip, 8, |_| true).unwrap();
        assert_eq!(assets.len(), 2);
    }

    #[test]
    fn test_separable_images() {
        assert!(is_separable_image("photos/a.gif", "__MACOSX"));
        assert!(is_separable_image("b.BMP", "__MACOSX"));
        assert!(!is_separable_image("__MACOSX/b.png", "__MACOSX"));
        assert!(!is_separable_image("notes.txt", "__MACOSX"));
    }
}
