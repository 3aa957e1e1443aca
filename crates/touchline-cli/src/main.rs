mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use std::process::ExitCode;

use touchline_core::TouchlineConfig;

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(&cli).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    let config = TouchlineConfig::load(cli.config.as_deref())?;

    let output = commands::run(cli, config).await?;
    output::render(&output.data, cli.pretty)?;

    if output.failed {
        return Ok(ExitCode::from(3));
    }

    Ok(ExitCode::SUCCESS)
}
