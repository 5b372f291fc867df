use crate::config::{data_dir, Config};
use anyhow::{Context, Result};
use env_logger::{Env, Target};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

const LOG_FILE: &str = "weekplan.log";

/// Where log records go. The terminal UI owns the screen, so it logs to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSink {
    Stderr,
    File,
}

pub fn init(config: &Config, sink: LogSink) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    if sink == LogSink::File {
        let path = log_path(config)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening log file {:?}", path))?;
        builder.target(Target::Pipe(Box::new(file)));
    }
    // a logger may already be installed (tests); keep the first one
    if builder.try_init().is_err() {
        log::debug!("logger already initialized");
    }
    Ok(())
}

fn log_path(config: &Config) -> Result<PathBuf> {
    match &config.log_file {
        Some(path) => Ok(path.clone()),
        None => Ok(data_dir()?.join(LOG_FILE)),
    }
}
