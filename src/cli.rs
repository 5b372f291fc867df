use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "weekplan", version, about = "Drag task cards onto the days of the week")]
pub struct Cli {
    /// Use this config file instead of searching for one
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default .weekplan/config.yml in the current directory
    Init,
    /// Print the days of a week with their day keys
    Week {
        /// Any day of the week to show, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Print the tasks the pool starts with
    Tasks,
    /// Launch the interactive TUI
    Tui,
}
