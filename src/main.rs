mod cli;
mod commands;
mod config;
mod logging;
mod model;
mod ui;
mod week;

use anyhow::Result;
use clap::Parser;
use std::env;
use std::path::Path;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let command = args.command.unwrap_or(cli::Command::Tui);

    let cwd = env::current_dir()?;
    let (config, location) = config_for(&command, args.config.as_deref(), &cwd)?;
    let sink = match command {
        cli::Command::Tui => logging::LogSink::File,
        _ => logging::LogSink::Stderr,
    };
    logging::init(&config, sink)?;
    if let Some(location) = &location {
        log::debug!(
            "using {} config {:?}",
            location.scope.label(),
            location.path
        );
    }

    match command {
        cli::Command::Init => commands::init(),
        cli::Command::Week { date } => commands::week(date, &config),
        cli::Command::Tasks => commands::tasks(&config),
        cli::Command::Tui => commands::tui(&config),
    }
}

/// `init` writes a fresh config, so an existing one is never read for it.
fn config_for(
    command: &cli::Command,
    explicit: Option<&Path>,
    cwd: &Path,
) -> Result<(config::Config, Option<config::ConfigLocation>)> {
    if matches!(command, cli::Command::Init) {
        return Ok((config::Config::default(), None));
    }
    let location = config::locate_config(explicit, cwd)?;
    let config = config::load_config(&location)?;
    Ok((config, Some(location)))
}
