//! Tabular artifact export and import
//!
//! The artifact is a UTF-8 CSV with a fixed metadata block on top:
//!
//! ```text
//! Slip extraction results        <- title
//! case_id,<value>
//! case_title,<value>
//! evidence_id,<value>
//! processed_at,<RFC 3339>
//! ""                             <- blank separator
//! Transactions                   <- section label
//! file,bank,sender_name,...      <- header, record number HEADER_OFFSET
//! <one row per record>
//! ```
//!
//! Readers count CSV records, not lines, so quoted newlines inside a field
//! do not shift the header.

use std::io::{Read, Write};

use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{TransactionRecord, RECORD_COLUMNS};

/// Records before the column header
pub const HEADER_OFFSET: usize = 7;

pub const ARTIFACT_TITLE: &str = "Slip extraction results";
pub const SECTION_LABEL: &str = "Transactions";
pub const CONTENT_TYPE: &str = "text/csv";

/// Case envelope written above the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub case_id: String,
    pub case_title: String,
    pub evidence_id: String,
    pub processed_at: DateTime<Utc>,
}

impl ArtifactMetadata {
    pub fn new(case_id: &str, case_title: &str, evidence_id: &str) -> Self {
        Self {
            case_id: case_id.to_string(),
            case_title: case_title.to_string(),
            evidence_id: evidence_id.to_string(),
            processed_at: Utc::now(),
        }
    }
}

/// A parsed artifact before its rows are interpreted
#[derive(Debug, Clone)]
pub struct ArtifactTable {
    pub metadata: ArtifactMetadata,
    pub header: Vec<String>,
    pub rows: Vec<StringRecord>,
}

impl ArtifactTable {
    /// Index of a named column
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Indices of `names`, or an error naming every missing column
    pub fn require_columns(&self, names: &[&str]) -> Result<Vec<usize>> {
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|n| self.column(n).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(Error::Artifact(format!(
                "Header is missing columns: {}",
                missing.join(", ")
            )));
        }
        Ok(names.iter().filter_map(|n| self.column(n)).collect())
    }

    /// Interpret rows as records; the header must be the full record layout
    pub fn into_records(self) -> Result<Vec<TransactionRecord>> {
        if self.header != RECORD_COLUMNS {
            return Err(Error::Artifact(format!(
                "Unexpected header at record {}: {}",
                HEADER_OFFSET,
                self.header.join(",")
            )));
        }
        Ok(self
            .rows
            .iter()
            .map(|row| TransactionRecord::from_fields(&row.iter().collect::<Vec<_>>()))
            .collect())
    }
}

/// Write the metadata block, header, and one row per record
pub fn write_artifact<W: Write>(
    writer: W,
    metadata: &ArtifactMetadata,
    records: &[TransactionRecord],
) -> Result<()> {
    let mut wtr = WriterBuilder::new().flexible(true).from_writer(writer);

    let processed_at = metadata.processed_at.to_rfc3339();
    wtr.write_record([ARTIFACT_TITLE])?;
    wtr.write_record(["case_id", metadata.case_id.as_str()])?;
    wtr.write_record(["case_title", metadata.case_title.as_str()])?;
    wtr.write_record(["evidence_id", metadata.evidence_id.as_str()])?;
    wtr.write_record(["processed_at", processed_at.as_str()])?;
    wtr.write_record([""])?;
    wtr.write_record([SECTION_LABEL])?;

    wtr.write_record(RECORD_COLUMNS)?;
    for record in records {
        wtr.write_record(record.fields())?;
    }

    wtr.flush()?;
    debug!("Wrote artifact with {} records", records.len());
    Ok(())
}

/// Artifact as bytes, ready for a blob store
pub fn artifact_bytes(metadata: &ArtifactMetadata, records: &[TransactionRecord]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_artifact(&mut buf, metadata, records)?;
    Ok(buf)
}

/// Parse the metadata block and locate the header at [`HEADER_OFFSET`]
pub fn read_table<R: Read>(reader: R) -> Result<ArtifactTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut leading = Vec::with_capacity(HEADER_OFFSET + 1);
    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        if i <= HEADER_OFFSET {
            leading.push(record);
        } else {
            rows.push(record);
        }
    }

    if leading.len() <= HEADER_OFFSET {
        return Err(Error::Artifact(format!(
            "Artifact has {} records, header expected at record {}",
            leading.len(),
            HEADER_OFFSET
        )));
    }

    let value = |i: usize| leading[i].get(1).unwrap_or("").to_string();
    let processed_at = DateTime::parse_from_rfc3339(&value(4))
        .map_err(|e| Error::Artifact(format!("Invalid processed_at: {}", e)))?
        .with_timezone(&Utc);

    let metadata = ArtifactMetadata {
        case_id: value(1),
        case_title: value(2),
        evidence_id: value(3),
        processed_at,
    };
    let header = leading[HEADER_OFFSET].iter().map(str::to_string).collect();

    Ok(ArtifactTable {
        metadata,
        header,
        rows,
    })
}

/// Read back the metadata and records written by [`write_artifact`]
pub fn read_artifact<R: Read>(reader: R) -> Result<(ArtifactMetadata, Vec<TransactionRecord>)> {
    let table = read_table(reader)?;
    let metadata = table.metadata.clone();
    Ok((metadata, table.into_records()?))
}
