use std::path::Path;

use serde::Serialize;
use touchline_core::{CacheStore, TouchlineConfig};

use crate::cli::{CacheArgs, CacheCommand};
use crate::error::CliError;

use super::CommandOutput;

#[derive(Debug, Serialize)]
struct Removed {
    removed: usize,
}

pub async fn run(
    args: &CacheArgs,
    config: &TouchlineConfig,
    dir_override: Option<&Path>,
) -> Result<CommandOutput, CliError> {
    let dir = dir_override.unwrap_or(config.cache.dir.as_path());
    let store = CacheStore::persistent(dir, config.cache.default_ttl());

    match args.command {
        CacheCommand::Stats => CommandOutput::new(&store.stats().await, false),
        CacheCommand::Sweep => CommandOutput::new(
            &Removed {
                removed: store.clear_expired().await,
            },
            false,
        ),
        CacheCommand::Clear => CommandOutput::new(
            &Removed {
                removed: store.clear_all().await,
            },
            false,
        ),
    }
}
