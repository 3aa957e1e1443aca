use touchline_core::{CacheMode, SourceManager, ValidationError};

use crate::cli::PlayerArgs;
use crate::error::CliError;

use super::CommandOutput;

pub async fn run(
    args: &PlayerArgs,
    manager: &SourceManager,
    mode: CacheMode,
) -> Result<CommandOutput, CliError> {
    if args.name.trim().is_empty() {
        return Err(ValidationError::EmptyPlayerName.into());
    }

    let result = manager
        .get_player_profile(&args.name, !args.no_market_value, mode)
        .await;
    CommandOutput::new(&result, result.error.is_some())
}
