use touchline_core::{CacheMode, LeagueCode, SourceManager, StandingsRequest};

use crate::cli::StandingsArgs;
use crate::error::CliError;

use super::CommandOutput;

pub async fn run(
    args: &StandingsArgs,
    manager: &SourceManager,
    mode: CacheMode,
) -> Result<CommandOutput, CliError> {
    let league = LeagueCode::parse(&args.league)?;
    let season = args
        .season
        .as_deref()
        .map(str::trim)
        .filter(|season| !season.is_empty())
        .map(str::to_owned);

    let result = manager
        .get_standings(StandingsRequest::new(league, season), mode)
        .await;
    CommandOutput::new(&result, result.error.is_some())
}
