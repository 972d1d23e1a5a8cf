use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tripvault_restore::archive::{read_archive, write_archive, ArchiveContents, ArchiveDraft};
use tripvault_restore::validate::{ENTRIES_FILE, META_FILE, TRIP_FILE};
use tripvault_restore::{
    DrySummary, KnownRecords, ReadLimits, ReadLimitsOverrides, RestoreError, RestoreValidator,
    ValidatorOptions,
};

use super::super::args::{
    OutputFormat, RestoreArgs, RestoreCheckArgs, RestorePackArgs, RestoreSub,
};
use crate::exit_codes;

pub fn run(args: RestoreArgs) -> Result<i32> {
    match args.cmd {
        RestoreSub::Check(a) => cmd_check(a),
        RestoreSub::Pack(a) => cmd_pack(a),
    }
}

/// Machine-readable outcome of `restore check --format json`.
/// Exactly one of `error` and `summary` is set.
#[derive(Serialize)]
struct CheckReport<'a> {
    ok: bool,
    error: Option<&'a RestoreError>,
    summary: Option<&'a DrySummary>,
}

fn cmd_check(args: RestoreCheckArgs) -> Result<i32> {
    let limits = parse_limits(args.limits.as_deref())?;

    let mut options = ValidatorOptions::default();
    if let Some(ref v) = args.app_version {
        options = options.with_app_version(v.trim());
    }
    let mut validator = RestoreValidator::new(options);
    if let Some(ref path) = args.known {
        validator = validator.with_known_records(load_known(path)?);
    }

    let label = args.archive.display().to_string();
    let contents = open_archive(&args.archive, limits)?;
    for p in &contents.unreadable {
        eprintln!("warning: {} is not valid JSON: {}", p.name, p.reason);
    }

    let result = contents.validate(&validator);
    match args.format {
        OutputFormat::Json => {
            let report = CheckReport {
                ok: result.is_ok(),
                error: result.as_ref().err(),
                summary: result.as_ref().ok(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => match &result {
            Ok(summary) => print_summary(&label, summary),
            Err(e) => {
                eprintln!("error: [{}] {}", e.code, e.message);
                eprintln!("restore check: FAILED ({})", label);
            }
        },
    }

    Ok(match result {
        Ok(_) => exit_codes::SUCCESS,
        Err(_) => exit_codes::VALIDATION_FAILED,
    })
}

fn open_archive(path: &Path, limits: ReadLimits) -> Result<ArchiveContents> {
    if path.as_os_str() == "-" {
        return read_archive(io::stdin().lock(), limits).context("failed to read archive from stdin");
    }
    let file = fs::File::open(path)
        .with_context(|| format!("failed to open archive: {}", path.display()))?;
    read_archive(file, limits).with_context(|| format!("failed to read archive: {}", path.display()))
}

fn print_summary(label: &str, summary: &DrySummary) {
    let c = &summary.counts;
    println!("restore check: OK ({})", label);
    println!("  trip:    {}", c.trip);
    println!("  entries: {}", c.entries);
    println!("  tags:    {}", c.tags);
    println!("  media:   {}", c.media);

    if summary.has_conflicts() {
        println!("conflicts ({}):", summary.conflicts.len());
        for (kind, ids) in [
            ("entries", &summary.conflicts.entries),
            ("media", &summary.conflicts.media),
            ("mediaUrls", &summary.conflicts.media_urls),
        ] {
            if !ids.is_empty() {
                println!("  {}: {}", kind, ids.join(", "));
            }
        }
    } else {
        println!("conflicts: none");
    }

    for w in &summary.warnings {
        eprintln!("warning: {}", w);
    }
}

fn parse_limits(raw: Option<&str>) -> Result<ReadLimits> {
    let defaults = ReadLimits::default();
    let Some(s) = raw else {
        return Ok(defaults);
    };
    let overrides = if s.starts_with('@') {
        let path = s.trim_start_matches('@').trim();
        if path.is_empty() {
            anyhow::bail!("--limits @path: path cannot be empty");
        }
        let content =
            fs::read_to_string(path).with_context(|| format!("limits file not found: {}", path))?;
        serde_json::from_str::<ReadLimitsOverrides>(&content)
            .with_context(|| format!("invalid limits JSON in {}", path))?
    } else {
        serde_json::from_str::<ReadLimitsOverrides>(s)
            .context("invalid --limits JSON (use --limits @path for a file)")?
    };
    Ok(defaults.apply(overrides))
}

fn load_known(path: &Path) -> Result<KnownRecords> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("known-records file not found: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("invalid known-records JSON in {}", path.display()))
}

fn cmd_pack(args: RestorePackArgs) -> Result<i32> {
    let read_payload = |name: &str| -> Result<Vec<u8>> {
        let path = args.dir.join(name);
        let bytes =
            fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_slice::<serde_json::Value>(&bytes)
            .with_context(|| format!("{} is not valid JSON", path.display()))?;
        Ok(bytes)
    };

    let mut draft = ArchiveDraft {
        meta: read_payload(META_FILE)?,
        trip: read_payload(TRIP_FILE)?,
        entries: read_payload(ENTRIES_FILE)?,
        media: Vec::new(),
    };

    let media_root = args.dir.join("media");
    if media_root.is_dir() {
        for path in collect_files_recursive(&media_root)? {
            let archive_path = archive_path(&args.dir, &path)?;
            let data =
                fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
            tracing::debug!(path = %archive_path, bytes = data.len(), "pack media");
            draft.add_media(archive_path, data);
        }
    }

    let mut out = Vec::new();
    write_archive(&mut out, &draft)?;
    fs::write(&args.output, &out)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    eprintln!(
        "restore pack: wrote {} ({} media files, {} bytes)",
        args.output.display(),
        draft.media.len(),
        out.len()
    );
    Ok(exit_codes::SUCCESS)
}

/// `root/media/a/b.jpg` -> `media/a/b.jpg`, always `/`-separated.
fn archive_path(root: &Path, path: &Path) -> Result<String> {
    let rel = path
        .strip_prefix(root)
        .with_context(|| format!("{} is outside {}", path.display(), root.display()))?;
    let mut parts = Vec::new();
    for c in rel.components() {
        match c {
            Component::Normal(s) => parts.push(
                s.to_str()
                    .with_context(|| format!("non UTF-8 file name: {}", path.display()))?,
            ),
            _ => anyhow::bail!("unexpected path component in {}", path.display()),
        }
    }
    Ok(parts.join("/"))
}

fn collect_files_recursive(root: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    collect_files_recursive_inner(root, &mut out)?;
    Ok(out)
}

fn collect_files_recursive_inner(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        // Editor and OS droppings (.DS_Store, .swp) never belong in an export.
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let ft = entry.file_type()?;
        if ft.is_dir() {
            collect_files_recursive_inner(&path, out)?;
        } else if ft.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_inline_json_overrides_defaults() {
        let limits = parse_limits(Some(r#"{"max_entries": 7}"#)).unwrap();
        assert_eq!(limits.max_entries, 7);
        assert_eq!(
            limits.max_payload_bytes,
            ReadLimits::default().max_payload_bytes
        );
    }

    #[test]
    fn limits_reject_unknown_keys_and_empty_path() {
        assert!(parse_limits(Some(r#"{"max_bogus": 1}"#)).is_err());
        assert!(parse_limits(Some("@")).is_err());
    }

    #[test]
    fn limits_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("limits.json");
        fs::write(&path, r#"{"max_path_len": 64}"#).unwrap();
        let limits = parse_limits(Some(&format!("@{}", path.display()))).unwrap();
        assert_eq!(limits.max_path_len, 64);
    }

    #[test]
    fn archive_paths_use_forward_slashes() {
        let root = Path::new("export");
        let file = root.join("media").join("entries").join("a.jpg");
        assert_eq!(archive_path(root, &file).unwrap(), "media/entries/a.jpg");
    }
}
