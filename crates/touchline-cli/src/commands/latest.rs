use std::sync::Arc;

use touchline_core::{BatchAggregator, CacheMode, SourceManager};

use crate::cli::LatestArgs;
use crate::error::CliError;

use super::CommandOutput;

pub async fn run(
    args: &LatestArgs,
    manager: Arc<SourceManager>,
    mode: CacheMode,
) -> Result<CommandOutput, CliError> {
    let latest = BatchAggregator::new(manager)
        .get_latest_matches(args.limit, mode)
        .await;
    CommandOutput::new(&latest, !latest.success)
}
