//! Deterministic trip archive writer (export format).
//!
//! Layout: `meta.json`, `trip.json`, `entries.json`, then `media/...` files
//! sorted by path. Headers are fixed (mtime 0, mode 0644, uid/gid 0) and the
//! gzip mtime is 0, so equal drafts produce byte-identical archives.

use crate::media_path::resolve_archive_media_path;
use crate::model::{ArchiveManifest, EntriesPayload, TripPayload};
use crate::validate::{ENTRIES_FILE, META_FILE, TRIP_FILE};
use anyhow::{Context, Result};
use flate2::{Compression, GzBuilder};
use std::io::Write;
use tar::{Builder, Header};

/// A media file to pack, addressed by its archive path (`media/...`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    pub path: String,
    pub data: Vec<u8>,
}

/// Serialized payloads plus media, ready to be written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveDraft {
    pub meta: Vec<u8>,
    pub trip: Vec<u8>,
    pub entries: Vec<u8>,
    pub media: Vec<ArchiveFile>,
}

impl ArchiveDraft {
    pub fn from_records(
        manifest: &ArchiveManifest,
        trip: &TripPayload,
        entries: &EntriesPayload,
    ) -> Result<Self> {
        Ok(Self {
            meta: serde_json::to_vec_pretty(manifest).context("serialize meta.json")?,
            trip: serde_json::to_vec_pretty(trip).context("serialize trip.json")?,
            entries: serde_json::to_vec_pretty(entries).context("serialize entries.json")?,
            media: Vec::new(),
        })
    }

    pub fn add_media(&mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.media.push(ArchiveFile {
            path: path.into(),
            data: data.into(),
        });
    }
}

/// Write `draft` to `w` as a deterministic `.tar.gz`.
pub fn write_archive<W: Write>(w: W, draft: &ArchiveDraft) -> Result<()> {
    let mut media = Vec::with_capacity(draft.media.len());
    for file in &draft.media {
        let path = resolve_archive_media_path(&file.path)
            .map_err(|v| anyhow::anyhow!("invalid media path '{}': {}", file.path, v))?;
        media.push((path, file.data.as_slice()));
    }
    media.sort_by(|a, b| a.0.cmp(&b.0));
    if let Some(dup) = media.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        anyhow::bail!("duplicate media path '{}'", dup[0].0);
    }

    let gz = GzBuilder::new().mtime(0).write(w, Compression::default());
    let mut tar = Builder::new(gz);
    tar.mode(tar::HeaderMode::Deterministic);

    append(&mut tar, META_FILE, &draft.meta)?;
    append(&mut tar, TRIP_FILE, &draft.trip)?;
    append(&mut tar, ENTRIES_FILE, &draft.entries)?;
    for (path, data) in &media {
        append(&mut tar, path, data)?;
    }

    let gz = tar.into_inner().context("finalize tar")?;
    gz.finish().context("finish gzip")?;
    Ok(())
}

fn append<T: Write>(tar: &mut Builder<T>, path: &str, data: &[u8]) -> Result<()> {
    let mut header = Header::new_gnu();
    header.set_path(path).with_context(|| format!("set path {}", path))?;
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(0);
    header.set_cksum();
    tar.append(&header, data)
        .with_context(|| format!("append {}", path))?;
    Ok(())
}
