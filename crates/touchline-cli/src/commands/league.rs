use std::sync::Arc;

use serde::Serialize;
use touchline_core::{BatchAggregator, CacheMode, LeagueCode, SourceManager, TouchlineConfig};

use crate::cli::LeagueArgs;
use crate::error::CliError;

use super::CommandOutput;

#[derive(Debug, Serialize)]
struct LeagueEntry<'a> {
    code: &'a str,
    name: &'a str,
    football_data: &'a str,
    api_football: u32,
}

pub async fn snapshot(
    args: &LeagueArgs,
    manager: Arc<SourceManager>,
    mode: CacheMode,
) -> Result<CommandOutput, CliError> {
    let league = LeagueCode::parse(&args.code)?;
    let snapshot = BatchAggregator::new(manager)
        .get_comprehensive_league_data(league, args.season.clone(), mode)
        .await;
    CommandOutput::new(&snapshot, !snapshot.success)
}

pub fn list(config: &TouchlineConfig) -> Result<CommandOutput, CliError> {
    let leagues = config
        .leagues
        .iter()
        .map(|league| LeagueEntry {
            code: league.code.as_str(),
            name: &league.name,
            football_data: &league.football_data,
            api_football: league.api_football,
        })
        .collect::<Vec<_>>();
    CommandOutput::new(&leagues, false)
}
