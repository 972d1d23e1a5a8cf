use clap::{Parser, Subcommand, ValueEnum};

pub mod restore;
pub use restore::*;

#[derive(Parser)]
#[command(
    name = "tripvault",
    version,
    about = "Trip journal archives: dry-run restore checks and deterministic packing"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Restore archive tooling (check/pack)
    Restore(RestoreArgs),
    Version,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
