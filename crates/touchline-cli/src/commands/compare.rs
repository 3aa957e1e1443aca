use std::sync::Arc;

use touchline_core::{BatchAggregator, CacheMode, SourceManager, ValidationError};

use crate::cli::CompareArgs;
use crate::error::CliError;

use super::CommandOutput;

pub async fn run(
    args: &CompareArgs,
    manager: Arc<SourceManager>,
    mode: CacheMode,
) -> Result<CommandOutput, CliError> {
    if args.player1.trim().is_empty() || args.player2.trim().is_empty() {
        return Err(ValidationError::EmptyPlayerName.into());
    }

    let comparison = BatchAggregator::new(manager)
        .get_player_comparison_data(&args.player1, &args.player2, mode)
        .await;
    CommandOutput::new(&comparison, !comparison.success)
}
