pub mod archive;
pub mod conflicts;
pub mod errors;
pub mod media_path;
pub mod model;
pub mod summary;
pub mod validate;
pub mod version;

// Convenience re-exports
pub use archive::{
    read_archive, write_archive, ArchiveContents, ArchiveDraft, ArchiveReadError, ReadLimits,
    ReadLimitsOverrides,
};
pub use conflicts::KnownRecords;
pub use errors::{ErrorClass, ErrorCode, RestoreError};
pub use model::{
    ArchiveManifest, EntriesPayload, EntryRecord, ManifestCounts, MediaRecord, Tag, TripPayload,
    TripRecord,
};
pub use summary::{Conflicts, DrySummary, SummaryCounts};
pub use validate::{validate, ParsedFiles, RestoreValidator, ValidatorOptions};
pub use version::{RELEASE_VERSION, SUPPORTED_SCHEMA_VERSION};
