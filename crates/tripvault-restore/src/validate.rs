//! Restore archive validation pipeline.
//!
//! Pure function over an already-unpacked archive: the flat list of entry
//! paths plus the three parsed JSON payloads. Checks run in a fixed order and
//! stop at the first failure:
//!
//! 1. required files present
//! 2. manifest schema version
//! 3. producing app version (major.minor)
//! 4. trip record and trip tags shape
//! 5. trip tag `normalizedName` uniqueness
//! 6. entries shape
//! 7. per-entry tag id uniqueness
//! 8. media path safety and existence
//!
//! A passing archive yields a [`DrySummary`] with counts and conflicts.
//! Conflicts never fail validation.

use crate::conflicts::{detect_conflicts, KnownRecords};
use crate::errors::{ErrorCode, RestoreError};
use crate::media_path::{
    is_absolute_path, is_media_listing, is_media_reference, normalize_segments,
    resolve_archive_media_path, resolve_media_reference, MEDIA_DIR,
};
use crate::model::{normalize_tag_name, ArchiveManifest, EntryRecord, Tag, TripRecord};
use crate::summary::{DrySummary, SummaryCounts};
use crate::version::{ReleaseLine, RELEASE_VERSION, SUPPORTED_SCHEMA_VERSION};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

pub const META_FILE: &str = "meta.json";
pub const TRIP_FILE: &str = "trip.json";
pub const ENTRIES_FILE: &str = "entries.json";

/// Payload files every archive must carry.
pub const REQUIRED_FILES: [&str; 3] = [META_FILE, TRIP_FILE, ENTRIES_FILE];

/// The three JSON payloads, already parsed but untyped.
///
/// `None` means the payload could not be obtained (absent or unparseable).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFiles {
    pub meta: Option<Value>,
    pub trip: Option<Value>,
    pub entries: Option<Value>,
}

impl ParsedFiles {
    fn get(&self, name: &str) -> Option<&Value> {
        match name {
            META_FILE => self.meta.as_ref(),
            TRIP_FILE => self.trip.as_ref(),
            ENTRIES_FILE => self.entries.as_ref(),
            _ => None,
        }
    }
}

/// Compatibility targets for validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorOptions {
    /// Accepted `meta.schemaVersion`.
    pub schema_version: u32,
    /// Release whose major.minor archives must match.
    pub app_version: String,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            schema_version: SUPPORTED_SCHEMA_VERSION,
            app_version: RELEASE_VERSION.to_string(),
        }
    }
}

impl ValidatorOptions {
    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }
}

/// Validate with default options and archive-internal conflict detection.
pub fn validate<S: AsRef<str>>(
    archive_entries: &[S],
    files: &ParsedFiles,
) -> Result<DrySummary, RestoreError> {
    RestoreValidator::default().validate(archive_entries, files)
}

/// Configured validator. Holds no per-call state and can be shared.
#[derive(Debug, Clone, Default)]
pub struct RestoreValidator {
    options: ValidatorOptions,
    known: KnownRecords,
}

impl RestoreValidator {
    pub fn new(options: ValidatorOptions) -> Self {
        Self {
            options,
            known: KnownRecords::default(),
        }
    }

    /// Also report archive records that collide with already-stored ones.
    pub fn with_known_records(mut self, known: KnownRecords) -> Self {
        self.known = known;
        self
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    pub fn validate<S: AsRef<str>>(
        &self,
        archive_entries: &[S],
        files: &ParsedFiles,
    ) -> Result<DrySummary, RestoreError> {
        let paths: Vec<&str> = archive_entries.iter().map(AsRef::as_ref).collect();

        tracing::debug!(entries = paths.len(), "restore: checking required files");
        let (meta, trip, entries) = check_presence(&paths, files)?;

        tracing::debug!("restore: checking manifest versions");
        let manifest = check_schema_version(meta, self.options.schema_version)?;
        check_app_version(&manifest.app_version, &self.options.app_version)?;

        tracing::debug!("restore: checking trip payload");
        let (trip, tags) = decode_trip(trip)?;
        check_tag_names(&tags)?;

        tracing::debug!("restore: checking entries payload");
        let entries = decode_entries(entries)?;
        check_entry_tags(&entries)?;

        tracing::debug!("restore: checking media paths");
        check_media_paths(&paths, &trip, &entries)?;

        let conflicts = detect_conflicts(&entries, &self.known);
        let counts = count_records(&tags, &entries);
        let warnings = advisory_warnings(&manifest, &trip, &entries, &counts);
        for warning in &warnings {
            tracing::warn!(trip_id = %trip.id, "restore: {}", warning);
        }

        tracing::info!(
            trip_id = %trip.id,
            entries = counts.entries,
            tags = counts.tags,
            media = counts.media,
            conflicts = conflicts.len(),
            "restore: dry run passed"
        );

        Ok(DrySummary {
            counts,
            conflicts,
            warnings,
        })
    }
}

fn is_listed(paths: &[&str], name: &str) -> bool {
    paths
        .iter()
        .any(|p| normalize_segments(p).is_some_and(|segments| segments == [name]))
}

fn check_presence<'a>(
    paths: &[&str],
    files: &'a ParsedFiles,
) -> Result<(&'a Value, &'a Value, &'a Value), RestoreError> {
    for name in REQUIRED_FILES {
        if !is_listed(paths, name) {
            return Err(RestoreError::missing_file(format!(
                "Archive is missing '{}'",
                name
            )));
        }
        if files.get(name).is_none() {
            return Err(RestoreError::missing_file(format!(
                "'{}' is listed but could not be read",
                name
            )));
        }
    }

    match (&files.meta, &files.trip, &files.entries) {
        (Some(meta), Some(trip), Some(entries)) => Ok((meta, trip, entries)),
        _ => Err(RestoreError::missing_file("Archive payloads are incomplete")),
    }
}

fn check_schema_version(meta: &Value, supported: u32) -> Result<ArchiveManifest, RestoreError> {
    let unsupported = |msg: String| RestoreError::new(ErrorCode::UnsupportedSchema, msg);

    let obj = meta
        .as_object()
        .ok_or_else(|| unsupported(format!("{} is not a JSON object", META_FILE)))?;

    let version = match obj.get("schemaVersion") {
        None | Some(Value::Null) => {
            return Err(unsupported(format!("{} has no schemaVersion", META_FILE)))
        }
        Some(v) => v
            .as_u64()
            .ok_or_else(|| unsupported(format!("schemaVersion must be an integer, got {}", v)))?,
    };

    if version != u64::from(supported) {
        return Err(unsupported(format!(
            "Unsupported schema version: {} (supported: {})",
            version, supported
        )));
    }

    ArchiveManifest::deserialize(meta).map_err(|e| {
        unsupported(format!(
            "{} does not match schema version {}: {}",
            META_FILE, supported, e
        ))
    })
}

fn check_app_version(archive: &str, ours: &str) -> Result<(), RestoreError> {
    let unsupported = |msg: String| RestoreError::new(ErrorCode::UnsupportedAppVersion, msg);

    let ours = ReleaseLine::parse(ours)
        .ok_or_else(|| unsupported(format!("Validator release '{}' is not a version", ours)))?;
    let theirs = ReleaseLine::parse(archive)
        .ok_or_else(|| unsupported(format!("appVersion '{}' is not a version", archive)))?;

    if theirs != ours {
        return Err(unsupported(format!(
            "Archive was exported by {} ({}), this release accepts {}.x",
            archive, theirs, ours
        )));
    }
    Ok(())
}

/// Human-readable id of an element that failed to decode, if it has one.
fn element_label(value: &Value) -> String {
    match value.get("id").and_then(Value::as_str) {
        Some(id) => format!(" ('{}')", id),
        None => String::new(),
    }
}

fn decode_array<T>(value: Option<&Value>, at: &str) -> Result<Vec<T>, RestoreError>
where
    T: for<'de> Deserialize<'de>,
{
    let items = value
        .and_then(Value::as_array)
        .ok_or_else(|| RestoreError::invalid_trip(format!("{} must be an array", at)))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            T::deserialize(item).map_err(|e| {
                RestoreError::invalid_trip(format!("{}[{}]{}: {}", at, i, element_label(item), e))
            })
        })
        .collect()
}

fn decode_trip(payload: &Value) -> Result<(TripRecord, Vec<Tag>), RestoreError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| RestoreError::invalid_trip(format!("{} is not a JSON object", TRIP_FILE)))?;

    let trip_value = obj
        .get("trip")
        .ok_or_else(|| RestoreError::invalid_trip(format!("{} has no trip", TRIP_FILE)))?;
    let trip = TripRecord::deserialize(trip_value)
        .map_err(|e| RestoreError::invalid_trip(format!("{}: trip: {}", TRIP_FILE, e)))?;

    let tags = decode_array(obj.get("tags"), &format!("{}: tags", TRIP_FILE))?;
    Ok((trip, tags))
}

fn check_tag_names(tags: &[Tag]) -> Result<(), RestoreError> {
    let mut seen: HashMap<String, &Tag> = HashMap::with_capacity(tags.len());
    for tag in tags {
        let key = normalize_tag_name(&tag.normalized_name);
        if let Some(first) = seen.get(&key) {
            return Err(RestoreError::new(
                ErrorCode::DuplicateTagName,
                format!(
                    "Tags '{}' ({}) and '{}' ({}) share normalized name '{}'",
                    first.name, first.id, tag.name, tag.id, key
                ),
            ));
        }
        seen.insert(key, tag);
    }
    Ok(())
}

fn decode_entries(payload: &Value) -> Result<Vec<EntryRecord>, RestoreError> {
    let obj = payload.as_object().ok_or_else(|| {
        RestoreError::invalid_trip(format!("{} is not a JSON object", ENTRIES_FILE))
    })?;
    decode_array(obj.get("entries"), &format!("{}: entries", ENTRIES_FILE))
}

fn check_entry_tags(entries: &[EntryRecord]) -> Result<(), RestoreError> {
    for entry in entries {
        let mut seen = HashSet::with_capacity(entry.tags.len());
        for tag in &entry.tags {
            if !seen.insert(tag.id.as_str()) {
                return Err(RestoreError::new(
                    ErrorCode::DuplicateEntryTag,
                    format!(
                        "Entry '{}' references tag '{}' more than once",
                        entry.id, tag.id
                    ),
                ));
            }
        }
    }
    Ok(())
}

/// Resolve a record URL and require the file to be packed in the archive.
fn check_reference(
    url: &str,
    listed: &HashSet<String>,
    field: &str,
) -> Result<(), RestoreError> {
    let resolved = resolve_media_reference(url).map_err(|violation| {
        RestoreError::invalid_media_path(format!("{} '{}': {}", field, url, violation))
    })?;
    if !listed.contains(&resolved) {
        return Err(RestoreError::invalid_media_path(format!(
            "{} '{}' points to '{}', which is not in the archive",
            field, url, resolved
        )));
    }
    Ok(())
}

/// `media`, `media/`, `./media/`: the directory entry itself, not a file.
fn is_media_dir_entry(path: &str) -> bool {
    !is_absolute_path(path)
        && path
            .split(['/', '\\'])
            .filter(|segment| !matches!(*segment, "" | "."))
            .eq([MEDIA_DIR])
}

fn check_media_paths(
    paths: &[&str],
    trip: &TripRecord,
    entries: &[EntryRecord],
) -> Result<(), RestoreError> {
    let mut listed = HashSet::new();
    for path in paths.iter().copied().filter(|p| is_media_listing(p)) {
        if is_media_dir_entry(path) {
            continue;
        }
        let resolved = resolve_archive_media_path(path).map_err(|violation| {
            RestoreError::invalid_media_path(format!("Archive entry '{}': {}", path, violation))
        })?;
        listed.insert(resolved);
    }

    if let Some(url) = trip.cover_image_url.as_deref() {
        if is_media_reference(url) {
            check_reference(url, &listed, "trip.coverImageUrl")?;
        }
    }

    for (i, entry) in entries.iter().enumerate() {
        if let Some(url) = entry.cover_image_url.as_deref() {
            if is_media_reference(url) {
                check_reference(url, &listed, &format!("entries[{}].coverImageUrl", i))?;
            }
        }
        for (j, media) in entry.media.iter().enumerate() {
            check_reference(&media.url, &listed, &format!("entries[{}].media[{}].url", i, j))?;
        }
    }
    Ok(())
}

fn count_records(tags: &[Tag], entries: &[EntryRecord]) -> SummaryCounts {
    let tag_ids: HashSet<&str> = tags
        .iter()
        .chain(entries.iter().flat_map(|e| e.tags.iter()))
        .map(|t| t.id.as_str())
        .collect();
    let media_ids: HashSet<&str> = entries
        .iter()
        .flat_map(|e| e.media.iter())
        .map(|m| m.id.as_str())
        .collect();

    SummaryCounts {
        trip: 1,
        entries: entries.len(),
        tags: tag_ids.len(),
        media: media_ids.len(),
    }
}

fn advisory_warnings(
    manifest: &ArchiveManifest,
    trip: &TripRecord,
    entries: &[EntryRecord],
    counts: &SummaryCounts,
) -> Vec<String> {
    let mut warnings = Vec::new();

    if manifest.trip_id != trip.id {
        warnings.push(format!(
            "manifest tripId '{}' differs from trip id '{}'",
            manifest.trip_id, trip.id
        ));
    }

    match manifest.counts {
        Some(declared) => {
            let checks = [
                ("trip", declared.trip, counts.trip),
                ("entries", declared.entries, counts.entries),
                ("media", declared.media, counts.media),
            ];
            for (name, declared, actual) in checks {
                if declared != actual as u64 {
                    warnings.push(format!(
                        "manifest declares {} {}, archive contains {}",
                        declared, name, actual
                    ));
                }
            }
        }
        None => warnings.push("manifest declares no counts".to_string()),
    }

    for entry in entries.iter().filter(|e| e.trip_id != trip.id) {
        warnings.push(format!(
            "entry '{}' belongs to trip '{}', archive trip is '{}'",
            entry.id, entry.trip_id, trip.id
        ));
    }

    warnings
}
