use touchline_core::{CacheMode, SourceManager, ValidationError};

use crate::cli::SearchArgs;
use crate::error::CliError;

use super::CommandOutput;

pub async fn run(
    args: &SearchArgs,
    manager: &SourceManager,
    mode: CacheMode,
) -> Result<CommandOutput, CliError> {
    let query = args.query.trim();
    if query.is_empty() {
        return Err(ValidationError::EmptyQuery.into());
    }

    let result = manager.search(query, mode).await;
    CommandOutput::new(&result, result.error.is_some())
}
