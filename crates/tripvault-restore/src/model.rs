//! Typed archive records.
//!
//! Field names follow the export wire format (camelCase). Optional fields may
//! be absent or `null`; a present field of the wrong JSON type fails decoding.
//! Unknown fields are ignored so additive export changes stay importable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `meta.json`: what the archive claims to contain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveManifest {
    pub schema_version: u32,
    pub trip_id: String,
    pub app_version: String,
    pub exported_at: DateTime<Utc>,
    /// Advisory only, never a failure source. Absent counts are tolerated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<ManifestCounts>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestCounts {
    pub trip: u64,
    pub entries: u64,
    pub media: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TripRecord {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    /// Case/whitespace-normalized dedup key for `name`.
    pub normalized_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: String,
    /// Path into the archive media namespace, e.g. `/uploads/entries/a.jpg`.
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntryRecord {
    pub id: String,
    pub trip_id: String,
    pub title: String,
    pub text: String,
    pub entry_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    pub tags: Vec<Tag>,
    pub media: Vec<MediaRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_icon_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `trip.json` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripPayload {
    pub trip: TripRecord,
    pub tags: Vec<Tag>,
}

/// `entries.json` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntriesPayload {
    pub entries: Vec<EntryRecord>,
}

/// Normalize a tag name into its dedup key: trimmed, inner whitespace
/// collapsed to one space, lowercased.
pub fn normalize_tag_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
