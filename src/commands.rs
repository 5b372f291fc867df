use crate::config::{init_project_config, Config};
use crate::model::{DayKey, Planner, Task};
use crate::ui;
use crate::week::{short_label, week_keys, week_of, Locale};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::env;

pub fn init() -> Result<()> {
    let cwd = env::current_dir()?;
    let (location, created) = init_project_config(&cwd)?;
    if created {
        log::info!("wrote default config to {:?}", location.path);
        println!("Initialized config at {}", location.path.display());
    } else {
        println!("Config already exists at {}", location.path.display());
    }
    Ok(())
}

pub fn week(date: Option<String>, config: &Config) -> Result<()> {
    let day = match date {
        Some(raw) => raw
            .parse::<DayKey>()
            .with_context(|| format!("parsing --date {}", raw))?
            .date(),
        None => Local::now().date_naive(),
    };
    for line in week_lines(day, config.date_locale) {
        println!("{}", line);
    }
    Ok(())
}

pub fn tasks(config: &Config) -> Result<()> {
    let planner = Planner::with_tasks(config.initial_tasks()).context("seeding tasks")?;
    print!("{}", render_tasks(planner.pool())?);
    Ok(())
}

pub fn tui(config: &Config) -> Result<()> {
    let planner = Planner::with_tasks(config.initial_tasks()).context("seeding tasks")?;
    log::info!("starting tui with {} task(s)", planner.task_count());
    ui::run(planner, config.locale, config.date_locale)
}

fn week_lines(day: NaiveDate, locale: Locale) -> Vec<String> {
    let days = week_of(day);
    week_keys(&days)
        .iter()
        .zip(days.iter())
        .map(|(key, date)| format!("{}  {}", key, short_label(*date, locale)))
        .collect()
}

#[derive(Serialize)]
struct TaskList<'a> {
    tasks: &'a [Task],
}

/// Tasks as a `tasks:` block that can be pasted into a config file.
fn render_tasks(tasks: &[Task]) -> Result<String> {
    serde_yaml::to_string(&TaskList { tasks }).context("serializing tasks")
}
