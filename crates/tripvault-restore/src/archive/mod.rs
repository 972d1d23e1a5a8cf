//! Trip archive container: a tar.gz holding `meta.json`, `trip.json`,
//! `entries.json` and `media/<namespace>/<file>` entries.
//!
//! - [`read`]: unpack an uploaded archive into validator input
//! - [`write`]: produce the export format
//! - [`limits`]: resource bounds for reading

pub mod limits;
pub mod read;
pub mod write;

pub use limits::{LimitKind, ReadLimits, ReadLimitsOverrides};
pub use read::{read_archive, ArchiveContents, ArchiveReadError, UnreadablePayload};
pub use write::{write_archive, ArchiveDraft, ArchiveFile};
