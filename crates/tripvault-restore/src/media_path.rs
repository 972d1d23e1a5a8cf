//! Media namespace mapping and traversal checks.
//!
//! Archive media lives under `media/`. Records reference it through the
//! public upload prefix (`/uploads/entries/a.jpg` is stored as
//! `media/entries/a.jpg`). Both `/` and `\` count as separators.

/// Archive directory holding media files.
pub const MEDIA_DIR: &str = "media";

/// Public URL prefix that maps onto [`MEDIA_DIR`].
pub const UPLOADS_PREFIX: &str = "uploads";

/// Why a media path was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaPathViolation {
    /// A `..` segment climbs above the archive root.
    EscapesRoot,
    /// Rooted path (`/x`, `\\x`, `C:x`) instead of an archive-relative one.
    Absolute,
    /// Resolves outside `media/`, or to `media/` itself.
    OutsideMediaDir(String),
}

impl std::fmt::Display for MediaPathViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EscapesRoot => f.write_str("path escapes the archive root"),
            Self::Absolute => f.write_str("absolute path in archive"),
            Self::OutsideMediaDir(resolved) => {
                write!(f, "path resolves to '{}', outside '{}/'", resolved, MEDIA_DIR)
            }
        }
    }
}

/// Resolve `.`/`..`/empty segments lexically.
///
/// Returns `None` when a `..` would climb above the root.
pub fn normalize_segments(path: &str) -> Option<Vec<&str>> {
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop()?;
            }
            s => out.push(s),
        }
    }
    Some(out)
}

/// True for raw archive paths whose first real segment is the media
/// directory (`media/a.jpg`, `./media/a.jpg`, `media\a.jpg`, `/media/a.jpg`).
///
/// Leading empty and `.` segments are skipped; anything after that is left
/// for [`resolve_archive_media_path`] to judge.
pub fn is_media_listing(path: &str) -> bool {
    path.split(['/', '\\'])
        .find(|segment| !matches!(*segment, "" | "."))
        .is_some_and(|first| first == MEDIA_DIR)
}

/// Rooted on any platform: leading separator or a drive prefix.
pub fn is_absolute_path(path: &str) -> bool {
    if path.starts_with(['/', '\\']) {
        return true;
    }
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// True for URLs that point into the media namespace (`/uploads/...` or
/// `media/...`). External URLs are not.
pub fn is_media_reference(url: &str) -> bool {
    let p = url.trim_start_matches(['/', '\\']);
    [UPLOADS_PREFIX, MEDIA_DIR].iter().any(|prefix| {
        p.strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with(['/', '\\']))
    })
}

/// Normalize an archive path and require it to resolve strictly inside
/// `media/`. Returns the canonical `media/...` form.
pub fn resolve_archive_media_path(path: &str) -> Result<String, MediaPathViolation> {
    if is_absolute_path(path) {
        return Err(MediaPathViolation::Absolute);
    }
    let segments = normalize_segments(path).ok_or(MediaPathViolation::EscapesRoot)?;
    match segments.split_first() {
        Some((first, rest)) if *first == MEDIA_DIR && !rest.is_empty() => Ok(segments.join("/")),
        _ => Err(MediaPathViolation::OutsideMediaDir(segments.join("/"))),
    }
}

/// Map a record URL to the archive path it must be stored at.
///
/// `/uploads/<rest>` becomes `media/<rest>`; `media/<rest>` maps to itself.
/// The prefix is swapped before normalization, so `/uploads/../x` escapes.
pub fn resolve_media_reference(url: &str) -> Result<String, MediaPathViolation> {
    let trimmed = url.trim_start_matches(['/', '\\']);
    let rebased = match trimmed.strip_prefix(UPLOADS_PREFIX) {
        Some(rest) if rest.starts_with(['/', '\\']) => format!("{}{}", MEDIA_DIR, rest),
        _ => trimmed.to_string(),
    };
    resolve_archive_media_path(&rebased)
}
