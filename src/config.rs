//! Application-level configuration loading: scoring rules, debounce window and storage selection.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationMilliSeconds, serde_as};
use tracing::{info, warn};

use crate::{scoring::ScoringRules, state::undo::DEFAULT_UNDO_CAPACITY};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SCORE_DESK_CONFIG_PATH";
/// Quiet window after the last score mutation before the snapshot is written.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);
const DEFAULT_HISTORY_DIR: &str = "data/history";

/// Storage backend selected at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// In-process store, optionally seeded from a fixture.
    #[default]
    Memory,
    /// CouchDB over HTTP.
    Couch,
    /// MongoDB.
    Mongo,
}

/// Immutable runtime configuration shared across the application.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Debounce window for score writes.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "debounce_ms")]
    pub debounce: Duration,
    /// Maximum number of undo entries kept per match.
    pub undo_capacity: usize,
    /// Points needed to take a singles set.
    pub singles_points: u32,
    /// Points needed to take a doubles set.
    pub doubles_points: u32,
    /// Directory holding undo history; `None` keeps history in memory.
    pub history_dir: Option<PathBuf>,
    /// Which match store to connect to.
    pub storage: StorageBackend,
    /// JSON fixture loaded into the memory store.
    pub seed_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let rules = ScoringRules::default();
        Self {
            debounce: DEFAULT_DEBOUNCE,
            undo_capacity: DEFAULT_UNDO_CAPACITY,
            singles_points: rules.singles_points,
            doubles_points: rules.doubles_points,
            history_dir: Some(PathBuf::from(DEFAULT_HISTORY_DIR)),
            storage: StorageBackend::default(),
            seed_path: None,
        }
    }
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        storage = ?config.storage,
                        debounce_ms = config.debounce.as_millis() as u64,
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        let mut config = serde_json::from_str::<Self>(contents)?;
        if config.undo_capacity == 0 {
            config.undo_capacity = DEFAULT_UNDO_CAPACITY;
        }
        Ok(config)
    }

    /// Winning scores for set-based sports.
    pub fn scoring_rules(&self) -> ScoringRules {
        ScoringRules {
            singles_points: self.singles_points,
            doubles_points: self.doubles_points,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
