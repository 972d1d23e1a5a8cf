//! Unpack a `.tar.gz` trip archive into validator input.
//!
//! Lists every entry path as stored (traversal is judged by the validator,
//! not here) and parses the three JSON payloads. Media bytes are skipped.

use crate::archive::limits::{CappedReader, LimitKind, ReadLimits, RetryInterrupted};
use crate::errors::RestoreError;
use crate::media_path::normalize_segments;
use crate::summary::DrySummary;
use crate::validate::{ParsedFiles, RestoreValidator, ENTRIES_FILE, META_FILE, TRIP_FILE};
use flate2::read::GzDecoder;
use serde_json::Value;
use std::io::Read;

/// Failure to obtain the archive contents at all.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveReadError {
    #[error("{kind}: {message}")]
    Limit { kind: LimitKind, message: String },
    #[error("corrupt archive: {context}")]
    Corrupt {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ArchiveReadError {
    fn limit(kind: LimitKind, message: impl Into<String>) -> Self {
        Self::Limit {
            kind,
            message: message.into(),
        }
    }

    fn from_io(err: std::io::Error, context: impl Into<String>) -> Self {
        match LimitKind::from_io(&err) {
            Some(kind) => Self::limit(kind, err.to_string()),
            None => Self::Corrupt {
                context: context.into(),
                source: err,
            },
        }
    }
}

/// A payload that was present but could not be parsed as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadablePayload {
    pub name: &'static str,
    pub reason: String,
}

/// Everything the validator needs from an archive.
#[derive(Debug, Clone, Default)]
pub struct ArchiveContents {
    /// Entry paths in archive order, as stored.
    pub entries: Vec<String>,
    pub files: ParsedFiles,
    pub unreadable: Vec<UnreadablePayload>,
}

impl ArchiveContents {
    pub fn validate(&self, validator: &RestoreValidator) -> Result<DrySummary, RestoreError> {
        validator.validate(&self.entries, &self.files)
    }

    fn slot(&mut self, name: &str) -> Option<(&'static str, &mut Option<Value>)> {
        match name {
            META_FILE => Some((META_FILE, &mut self.files.meta)),
            TRIP_FILE => Some((TRIP_FILE, &mut self.files.trip)),
            ENTRIES_FILE => Some((ENTRIES_FILE, &mut self.files.entries)),
            _ => None,
        }
    }
}

/// Read a gzip-compressed tar archive within `limits`.
pub fn read_archive<R: Read>(
    reader: R,
    limits: ReadLimits,
) -> Result<ArchiveContents, ArchiveReadError> {
    let reader = RetryInterrupted::new(reader);
    let reader = CappedReader::new(reader, limits.max_archive_bytes, LimitKind::ArchiveBytes);
    let decoder = GzDecoder::new(reader);
    let decoder = CappedReader::new(decoder, limits.max_decode_bytes, LimitKind::DecodeBytes);
    let mut archive = tar::Archive::new(decoder);

    let mut contents = ArchiveContents::default();

    let entries = archive
        .entries()
        .map_err(|e| ArchiveReadError::from_io(e, "gzip/tar stream"))?;

    for (i, entry) in entries.enumerate() {
        let mut entry = entry.map_err(|e| ArchiveReadError::from_io(e, format!("entry #{}", i)))?;

        if i >= limits.max_entries {
            return Err(ArchiveReadError::limit(
                LimitKind::Entries,
                format!("archive has more than {} entries", limits.max_entries),
            ));
        }

        let path = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        if path.len() > limits.max_path_len {
            return Err(ArchiveReadError::limit(
                LimitKind::PathLength,
                format!(
                    "path length {} exceeds limit {}",
                    path.len(),
                    limits.max_path_len
                ),
            ));
        }

        let is_file = entry.header().entry_type().is_file();
        let payload_name = normalize_segments(&path)
            .filter(|segments| segments.len() == 1)
            .map(|segments| segments[0].to_string());

        if let Some(name) = payload_name.filter(|_| is_file) {
            if let Some((name, slot)) = contents.slot(&name) {
                if slot.is_some() {
                    tracing::warn!(path = %path, "archive: duplicate {} ignored", name);
                } else {
                    let declared = entry
                        .header()
                        .size()
                        .map_err(|e| ArchiveReadError::from_io(e, path.clone()))?;
                    if declared > limits.max_payload_bytes {
                        return Err(ArchiveReadError::limit(
                            LimitKind::PayloadBytes,
                            format!(
                                "'{}' declares {} bytes, limit is {}",
                                path, declared, limits.max_payload_bytes
                            ),
                        ));
                    }

                    let mut raw = Vec::new();
                    CappedReader::new(&mut entry, limits.max_payload_bytes, LimitKind::PayloadBytes)
                        .read_to_end(&mut raw)
                        .map_err(|e| ArchiveReadError::from_io(e, path.clone()))?;

                    match serde_json::from_slice::<Value>(&raw) {
                        Ok(value) => *slot = Some(value),
                        Err(e) => {
                            tracing::warn!(path = %path, error = %e, "archive: unreadable payload");
                            contents.unreadable.push(UnreadablePayload {
                                name,
                                reason: e.to_string(),
                            });
                        }
                    }
                }
            }
        }

        contents.entries.push(path);
    }

    tracing::debug!(
        entries = contents.entries.len(),
        unreadable = contents.unreadable.len(),
        "archive: read complete"
    );
    Ok(contents)
}
