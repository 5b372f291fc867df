use crate::model::{seed_tasks, Task};
use crate::week::Locale;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const PROJECT_DIR: &str = ".weekplan";
const CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub locale: Locale,
    /// Weekday names in day labels. English unless configured.
    #[serde(default = "default_date_locale")]
    pub date_locale: Locale,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// Replaces the built-in seed tasks when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    Explicit,
    Project,
    Global,
}

#[derive(Debug, Clone)]
pub struct ConfigLocation {
    pub path: PathBuf,
    pub scope: ConfigScope,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            locale: Locale::default(),
            date_locale: default_date_locale(),
            log_file: None,
            tasks: None,
        }
    }
}

fn default_date_locale() -> Locale {
    Locale::En
}

impl Config {
    pub fn initial_tasks(&self) -> Vec<Task> {
        self.tasks.clone().unwrap_or_else(seed_tasks)
    }
}

impl ConfigScope {
    pub fn label(&self) -> &'static str {
        match self {
            ConfigScope::Explicit => "explicit",
            ConfigScope::Project => "project",
            ConfigScope::Global => "global",
        }
    }
}

pub fn init_project_config(dir: &Path) -> Result<(ConfigLocation, bool)> {
    let config_dir = dir.join(PROJECT_DIR);
    fs::create_dir_all(&config_dir)
        .with_context(|| format!("creating {:?}", config_dir))?;
    let location = ConfigLocation {
        path: config_dir.join(CONFIG_FILE),
        scope: ConfigScope::Project,
    };
    if location.path.exists() {
        return Ok((location, false));
    }
    let config = Config {
        tasks: Some(seed_tasks()),
        ..Config::default()
    };
    save_config(&location, &config)?;
    Ok((location, true))
}

pub fn locate_config(explicit: Option<&Path>, start: &Path) -> Result<ConfigLocation> {
    if let Some(path) = explicit {
        return Ok(ConfigLocation {
            path: path.to_path_buf(),
            scope: ConfigScope::Explicit,
        });
    }
    if let Some(path) = find_project_config(start) {
        return Ok(ConfigLocation {
            path,
            scope: ConfigScope::Project,
        });
    }
    Ok(ConfigLocation {
        path: data_dir()?.join(CONFIG_FILE),
        scope: ConfigScope::Global,
    })
}

pub fn load_config(location: &ConfigLocation) -> Result<Config> {
    if !location.path.exists() {
        if location.scope == ConfigScope::Explicit {
            anyhow::bail!("config file {:?} does not exist", location.path);
        }
        log::debug!("no config at {:?}, using defaults", location.path);
        return Ok(Config::default());
    }
    let data = fs::read_to_string(&location.path)
        .with_context(|| format!("reading {:?}", location.path))?;
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("parsing config file {:?}", location.path))?;
    Ok(config)
}

pub fn save_config(location: &ConfigLocation, config: &Config) -> Result<()> {
    if let Some(parent) = location.path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let serialized = serde_yaml::to_string(config).context("serializing config")?;
    fs::write(&location.path, serialized)
        .with_context(|| format!("writing {:?}", location.path))?;
    Ok(())
}

pub fn data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "weekplan").context("locating data directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(PROJECT_DIR).join(CONFIG_FILE);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}
