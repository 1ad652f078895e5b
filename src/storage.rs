use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::sink::{AdvancedFilter, FilterSink, FilterTarget, PersistedSelection, PersistenceSink};

const CONFIG_FILE: &str = ".rangeslicer.json";
const STATE_FILE: &str = ".rangeslicer-state.json";
const FILTER_FILE: &str = ".rangeslicer-filter.json";
const LOG_FILE: &str = ".rangeslicer.log";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Terminal,
    Light,
    Dark,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub theme: ThemePreference,
    /// Preset key used when nothing was persisted. `None` starts on the last 7 days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_preset: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: ThemePreference::default(),
            default_preset: None,
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

pub fn home_file(name: &str) -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(name);
    Some(path)
}

pub fn config_path() -> Option<PathBuf> {
    home_file(CONFIG_FILE)
}

pub fn default_log_path() -> Option<PathBuf> {
    home_file(LOG_FILE)
}

/// Missing or unreadable config yields the defaults.
pub fn read_config() -> Config {
    config_path()
        .and_then(|path| read_json::<Config>(&path))
        .unwrap_or_default()
}

/// Persistence sink backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_home() -> Result<Self> {
        home_file(STATE_FILE).map(Self::at).ok_or(Error::HomeDirMissing)
    }

    pub fn load(&self) -> Option<PersistedSelection> {
        read_json(&self.path)
    }
}

impl PersistenceSink for FileStateStore {
    fn persist(&mut self, selection: &PersistedSelection) -> Result<()> {
        write_json(&self.path, selection)
    }
}

/// Filter sink that keeps the active filter in a JSON file for the host to pick up.
#[derive(Debug, Clone)]
pub struct FileFilterSink {
    path: PathBuf,
}

impl FileFilterSink {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_home() -> Result<Self> {
        home_file(FILTER_FILE).map(Self::at).ok_or(Error::HomeDirMissing)
    }

    pub fn active(&self) -> Option<AdvancedFilter> {
        read_json(&self.path)
    }
}

impl FilterSink for FileFilterSink {
    fn apply(&mut self, filter: &AdvancedFilter) -> Result<()> {
        write_json(&self.path, filter)
    }

    fn clear(&mut self, target: &FilterTarget) -> Result<()> {
        if let Some(active) = self.active() {
            if active.target != *target {
                return Ok(());
            }
        }
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let contents = fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}
