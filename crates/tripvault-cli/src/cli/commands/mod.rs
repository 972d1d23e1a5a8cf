use super::args::*;

pub(crate) mod restore;

use crate::exit_codes::SUCCESS;
use tripvault_restore::{RELEASE_VERSION, SUPPORTED_SCHEMA_VERSION};

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Restore(args) => restore::run(args),
        Command::Version => {
            println!(
                "tripvault {} (archive schema {})",
                RELEASE_VERSION, SUPPORTED_SCHEMA_VERSION
            );
            Ok(SUCCESS)
        }
    }
}
