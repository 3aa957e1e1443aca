mod cache;
mod compare;
mod latest;
mod league;
mod matches;
mod player;
mod search;
mod standings;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use touchline_core::{CacheMode, SourceManager, SourceManagerBuilder, TouchlineConfig};

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Rendered command payload plus whether the result carried an error.
pub struct CommandOutput {
    pub data: Value,
    pub failed: bool,
}

impl CommandOutput {
    pub fn new(data: &impl Serialize, failed: bool) -> Result<Self, CliError> {
        Ok(Self {
            data: serde_json::to_value(data)?,
            failed,
        })
    }
}

pub async fn run(cli: &Cli, config: TouchlineConfig) -> Result<CommandOutput, CliError> {
    let mode = cache_mode(cli);
    debug!(?mode, command = ?cli.command, "dispatching command");

    match &cli.command {
        Command::Leagues => league::list(&config),
        Command::Cache(args) => cache::run(args, &config, cli.cache_dir.as_deref()).await,
        Command::Matches(args) => matches::run(args, &build_manager(cli, config), mode).await,
        Command::Standings(args) => standings::run(args, &build_manager(cli, config), mode).await,
        Command::Player(args) => player::run(args, &build_manager(cli, config), mode).await,
        Command::Compare(args) => compare::run(args, build_manager(cli, config), mode).await,
        Command::League(args) => league::snapshot(args, build_manager(cli, config), mode).await,
        Command::Latest(args) => latest::run(args, build_manager(cli, config), mode).await,
        Command::Search(args) => search::run(args, &build_manager(cli, config), mode).await,
    }
}

fn cache_mode(cli: &Cli) -> CacheMode {
    if cli.no_cache {
        CacheMode::Bypass
    } else if cli.refresh {
        CacheMode::Refresh
    } else {
        CacheMode::Use
    }
}

fn build_manager(cli: &Cli, config: TouchlineConfig) -> Arc<SourceManager> {
    let mut builder = SourceManagerBuilder::new(config);
    if let Some(dir) = &cli.cache_dir {
        builder = builder.with_cache_dir(dir);
    }
    Arc::new(builder.build())
}
