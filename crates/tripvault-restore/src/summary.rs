//! Dry-run summary returned by a successful validation.

use serde::{Deserialize, Serialize};

/// What an import would create, plus conflicts for the caller to resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrySummary {
    pub counts: SummaryCounts,
    pub conflicts: Conflicts,
    /// Advisory findings that do not block the import.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCounts {
    pub trip: usize,
    pub entries: usize,
    /// Distinct tag ids across trip tags and entry tags.
    pub tags: usize,
    /// Distinct media ids across all entries.
    pub media: usize,
}

/// Ids and URLs that appear more than once where uniqueness is expected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflicts {
    pub entries: Vec<String>,
    pub media: Vec<String>,
    pub media_urls: Vec<String>,
}

impl Conflicts {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.media.is_empty() && self.media_urls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len() + self.media.len() + self.media_urls.len()
    }
}

impl DrySummary {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}
