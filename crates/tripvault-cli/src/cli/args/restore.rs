//! Restore command arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::OutputFormat;

#[derive(Parser, Debug)]
pub struct RestoreArgs {
    #[command(subcommand)]
    pub cmd: RestoreSub,
}

#[derive(Subcommand, Debug)]
pub enum RestoreSub {
    /// Dry-run an archive through the restore checks without importing anything
    Check(RestoreCheckArgs),
    /// Pack an exported trip directory into a deterministic .tar.gz archive
    Pack(RestorePackArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RestoreCheckArgs {
    /// Archive to check (.tar.gz), or `-` for stdin
    pub archive: PathBuf,

    /// Version of the importing application (default: this build)
    #[arg(long, env = "TRIPVAULT_APP_VERSION")]
    pub app_version: Option<String>,

    /// Reader limit overrides: inline JSON or @path
    /// (e.g. '{"max_entries": 5000}')
    #[arg(long)]
    pub limits: Option<String>,

    /// JSON file with records already present in the target store
    /// ({"entryIds": [...], "mediaIds": [...], "mediaUrls": [...]})
    #[arg(long)]
    pub known: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Clone)]
pub struct RestorePackArgs {
    /// Directory holding meta.json, trip.json, entries.json and media/
    pub dir: PathBuf,

    /// Output archive path
    #[arg(short, long)]
    pub output: PathBuf,
}
