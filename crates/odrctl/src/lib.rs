//! odrctl library - exposes modules for testing

pub mod cli;
pub mod commands;
pub mod errors;
pub mod logging;
pub mod output;

use anyhow::Result;
use odr_health::TokioSleeper;

use cli::{Cli, Commands};
use commands::Session;

/// Execute a parsed command line and return the process exit code.
pub async fn run(cli: Cli) -> Result<i32> {
    let session = Session::open(cli.config.as_deref(), cli.url.as_deref())?;

    match cli.command {
        Commands::Check { json } => commands::check(session, TokioSleeper, json).await,
        Commands::Get { controllable, param } => commands::get(&session.client, &controllable, &param).await,
        Commands::Set {
            controllable,
            param,
            value,
        } => commands::set(&session.client, &controllable, &param, &value).await,
        Commands::Params { json } => commands::params(&session.client, json).await,
        Commands::Dpd { action } => commands::dpd(&session.client, action).await,
    }
}
