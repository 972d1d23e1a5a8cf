//! Conflict detection: ids and URLs that would collide on import.
//!
//! Duplicates inside the archive are always reported. Collisions with data
//! that already exists are reported only for what the caller supplies in
//! [`KnownRecords`].

use crate::model::EntryRecord;
use crate::summary::Conflicts;
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};

/// Identifiers already persisted on the target side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct KnownRecords {
    pub entry_ids: BTreeSet<String>,
    pub media_ids: BTreeSet<String>,
    pub media_urls: BTreeSet<String>,
}

impl KnownRecords {
    pub fn is_empty(&self) -> bool {
        self.entry_ids.is_empty() && self.media_ids.is_empty() && self.media_urls.is_empty()
    }
}

/// Records first-seen order and reports each conflicting key once.
struct ConflictList<'a> {
    known: &'a BTreeSet<String>,
    seen: HashSet<&'a str>,
    reported: HashSet<&'a str>,
    out: Vec<String>,
}

impl<'a> ConflictList<'a> {
    fn new(known: &'a BTreeSet<String>) -> Self {
        Self {
            known,
            seen: HashSet::new(),
            reported: HashSet::new(),
            out: Vec::new(),
        }
    }

    fn observe(&mut self, key: &'a str) {
        let repeated = !self.seen.insert(key);
        if (repeated || self.known.contains(key)) && self.reported.insert(key) {
            self.out.push(key.to_string());
        }
    }

    fn finish(self) -> Vec<String> {
        self.out
    }
}

pub fn detect_conflicts(entries: &[EntryRecord], known: &KnownRecords) -> Conflicts {
    let mut entry_ids = ConflictList::new(&known.entry_ids);
    let mut media_ids = ConflictList::new(&known.media_ids);
    let mut media_urls = ConflictList::new(&known.media_urls);

    for entry in entries {
        entry_ids.observe(&entry.id);
        for media in &entry.media {
            media_ids.observe(&media.id);
            media_urls.observe(&media.url);
        }
    }

    Conflicts {
        entries: entry_ids.finish(),
        media: media_ids.finish(),
        media_urls: media_urls.finish(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MediaRecord;
    use chrono::{TimeZone, Utc};

    fn entry(id: &str, media: &[(&str, &str)]) -> EntryRecord {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        EntryRecord {
            id: id.into(),
            trip_id: "trip-1".into(),
            title: "t".into(),
            text: String::new(),
            entry_date: ts,
            cover_image_url: None,
            tags: vec![],
            media: media
                .iter()
                .map(|(id, url)| MediaRecord {
                    id: (*id).into(),
                    url: (*url).into(),
                    created_at: ts,
                })
                .collect(),
            latitude: None,
            longitude: None,
            location_name: None,
            weather_condition: None,
            weather_temperature: None,
            weather_icon_code: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn no_conflicts_for_unique_records() {
        let entries = vec![
            entry("e1", &[("m1", "/uploads/entries/a.jpg")]),
            entry("e2", &[("m2", "/uploads/entries/b.jpg")]),
        ];
        assert!(detect_conflicts(&entries, &KnownRecords::default()).is_empty());
    }

    #[test]
    fn duplicates_reported_once_in_first_seen_order() {
        let entries = vec![
            entry("e2", &[("m1", "/uploads/a.jpg")]),
            entry("e1", &[("m1", "/uploads/a.jpg")]),
            entry("e2", &[("m1", "/uploads/a.jpg")]),
            entry("e1", &[]),
        ];
        let c = detect_conflicts(&entries, &KnownRecords::default());
        assert_eq!(c.entries, vec!["e2", "e1"]);
        assert_eq!(c.media, vec!["m1"]);
        assert_eq!(c.media_urls, vec!["/uploads/a.jpg"]);
    }

    #[test]
    fn known_records_collide_on_first_sight() {
        let known = KnownRecords {
            entry_ids: ["e1".to_string()].into(),
            media_ids: BTreeSet::new(),
            media_urls: ["/uploads/b.jpg".to_string()].into(),
        };
        let entries = vec![
            entry("e1", &[("m1", "/uploads/a.jpg")]),
            entry("e2", &[("m2", "/uploads/b.jpg")]),
        ];
        let c = detect_conflicts(&entries, &known);
        assert_eq!(c.entries, vec!["e1"]);
        assert!(c.media.is_empty());
        assert_eq!(c.media_urls, vec!["/uploads/b.jpg"]);
    }
}
