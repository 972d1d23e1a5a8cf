//! Archive schema and application release compatibility.

/// The only archive schema version this validator understands.
pub const SUPPORTED_SCHEMA_VERSION: u32 = 1;

/// Release version of this crate, used as the default compatibility target.
pub const RELEASE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Major/minor pair of a release; patch, pre-release and build are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReleaseLine {
    pub major: u64,
    pub minor: u64,
}

impl ReleaseLine {
    /// Parse `[v]MAJOR.MINOR[.PATCH][-pre][+build]`.
    pub fn parse(version: &str) -> Option<Self> {
        let v = version.trim();
        let v = v.strip_prefix('v').unwrap_or(v);
        let core = v.split(['-', '+']).next()?;

        let mut parts = core.split('.');
        let major = parse_numeric(parts.next()?)?;
        let minor = parse_numeric(parts.next()?)?;
        if let Some(patch) = parts.next() {
            parse_numeric(patch)?;
        }
        if parts.next().is_some() {
            return None;
        }
        Some(Self { major, minor })
    }
}

impl std::fmt::Display for ReleaseLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

fn parse_numeric(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// True when `archive` was produced by the same major.minor as `ours`.
pub fn app_version_compatible(archive: &str, ours: &str) -> bool {
    match (ReleaseLine::parse(archive), ReleaseLine::parse(ours)) {
        (Some(a), Some(o)) => a == o,
        _ => false,
    }
}
