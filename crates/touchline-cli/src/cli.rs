//! CLI argument definitions for touchline.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `matches` | Fixtures filtered by league, date and status |
//! | `standings` | League table |
//! | `player` | Biography and market value for one player |
//! | `compare` | Two players side by side |
//! | `league` | Recent, upcoming and live fixtures plus the table |
//! | `latest` | Newest finished fixtures across every league |
//! | `search` | Free-text encyclopedia lookup |
//! | `leagues` | Configured league codes |
//! | `cache` | Cache statistics and maintenance |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--config` | none | TOML configuration file |
//! | `--cache-dir` | from config | Cache directory override |
//! | `--no-cache` | `false` | Neither read nor write the cache |
//! | `--refresh` | `false` | Skip cached entries but store fresh results |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `-v` | warn | Repeat to raise log verbosity |
//!
//! # Examples
//!
//! ```bash
//! touchline matches --league PL --date 2024-10-01 --status finished
//! touchline standings PL --season 2024 --pretty
//! touchline compare "Bukayo Saka" "Phil Foden"
//! touchline cache sweep
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// ⚽ touchline - rate-limited, cached football data
#[derive(Debug, Parser)]
#[command(
    name = "touchline",
    author,
    version,
    about = "Rate-limited, cached football data from several upstreams",
    long_about = "touchline fronts football-data.org, api-football, Wikipedia and \
Transfermarkt behind one interface. Results are JSON on stdout and are cached \
in memory and on disk.\n\
\n\
Use 'touchline <command> --help' for command-specific help."
)]
pub struct Cli {
    /// TOML configuration file. Credentials may also come from the environment.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Cache directory, overriding the configured one.
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Bypass the cache entirely.
    #[arg(long, global = true, default_value_t = false, conflicts_with = "refresh")]
    pub no_cache: bool,

    /// Ignore cached entries but store fresh results.
    #[arg(long, global = true, default_value_t = false)]
    pub refresh: bool,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Log verbosity on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// 📅 Fetch fixtures.
    ///
    /// # Examples
    ///
    ///   touchline matches --league PL --status finished
    ///   touchline matches --date 2024-10-01
    Matches(MatchesArgs),

    /// 📊 Fetch a league table.
    ///
    /// # Examples
    ///
    ///   touchline standings PL
    ///   touchline standings BL1 --season 2023
    Standings(StandingsArgs),

    /// 👤 Fetch a player profile.
    ///
    /// # Examples
    ///
    ///   touchline player "Bukayo Saka"
    ///   touchline player Haaland --no-market-value
    Player(PlayerArgs),

    /// ⚖️ Compare two players.
    Compare(CompareArgs),

    /// 🏟️ Fetch a league snapshot.
    League(LeagueArgs),

    /// 🕒 Newest finished fixtures across every league.
    ///
    /// # Examples
    ///
    ///   touchline latest
    ///   touchline latest --limit 25
    Latest(LatestArgs),

    /// 🔍 Free-text lookup.
    Search(SearchArgs),

    /// 📋 List configured league codes.
    Leagues,

    /// 📦 Cache management commands.
    Cache(CacheArgs),
}

/// Arguments for the `matches` command.
#[derive(Debug, Args)]
pub struct MatchesArgs {
    /// League code (e.g., PL, BL1, SA).
    #[arg(long)]
    pub league: Option<String>,

    /// Match date, YYYY-MM-DD.
    #[arg(long)]
    pub date: Option<String>,

    /// One of finished, scheduled, live, all.
    #[arg(long, default_value = "all")]
    pub status: String,
}

/// Arguments for the `standings` command.
#[derive(Debug, Args)]
pub struct StandingsArgs {
    /// League code.
    pub league: String,

    /// Season start year; defaults to the current year.
    #[arg(long)]
    pub season: Option<String>,
}

/// Arguments for the `player` command.
#[derive(Debug, Args)]
pub struct PlayerArgs {
    /// Full or partial player name.
    pub name: String,

    /// Skip the market-value lookup.
    #[arg(long, default_value_t = false)]
    pub no_market_value: bool,
}

/// Arguments for the `compare` command.
#[derive(Debug, Args)]
pub struct CompareArgs {
    pub player1: String,
    pub player2: String,
}

/// Arguments for the `league` command.
#[derive(Debug, Args)]
pub struct LeagueArgs {
    /// League code.
    pub code: String,

    #[arg(long)]
    pub season: Option<String>,
}

/// Arguments for the `latest` command.
#[derive(Debug, Args)]
pub struct LatestArgs {
    /// Maximum number of fixtures to return.
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

/// Arguments for the `search` command.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Free-form query (e.g., "2018 World Cup").
    pub query: String,
}

/// Arguments for the `cache` command group.
#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

/// Cache management subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Show entry counts for both tiers.
    Stats,
    /// Delete expired entries.
    Sweep,
    /// Delete every entry.
    Clear,
}
