use std::str::FromStr;

use touchline_core::{CacheMode, LeagueCode, MatchDate, MatchesRequest, SourceManager, StatusFilter};

use crate::cli::MatchesArgs;
use crate::error::CliError;

use super::CommandOutput;

pub fn parse_request(args: &MatchesArgs) -> Result<MatchesRequest, CliError> {
    let league = args.league.as_deref().map(LeagueCode::parse).transpose()?;
    let date = args.date.as_deref().map(MatchDate::parse).transpose()?;
    let status = StatusFilter::from_str(&args.status)?;
    Ok(MatchesRequest::new(league, date, status))
}

pub async fn run(
    args: &MatchesArgs,
    manager: &SourceManager,
    mode: CacheMode,
) -> Result<CommandOutput, CliError> {
    let request = parse_request(args)?;
    let result = manager.get_matches(request, mode).await;
    CommandOutput::new(&result, result.error.is_some())
}
