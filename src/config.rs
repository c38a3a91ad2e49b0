use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::EngineOptions;
use crate::error::EngineError;
use crate::selection::SelectionPolicy;
use crate::sequence::RateSequence;

pub const DEFAULT_TICK_MS: u64 = 100;

/// Where the cycling rates come from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateSource {
    /// The hand-enumerated classic list.
    #[default]
    Classic,
    Stepped {
        start: f64,
        step: f64,
        count: usize,
    },
    Listed {
        values: Vec<f64>,
    },
}

impl RateSource {
    pub fn build(&self) -> Result<RateSequence, EngineError> {
        match self {
            RateSource::Classic => Ok(RateSequence::classic()),
            RateSource::Stepped { start, step, count } => {
                RateSequence::stepped(*start, *step, *count)
            }
            RateSource::Listed { values } => RateSequence::new(values.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub policy: SelectionPolicy,
    pub tick_ms: u64,
    pub rates: RateSource,
    pub initial_index: usize,
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: SelectionPolicy::Random,
            tick_ms: DEFAULT_TICK_MS,
            rates: RateSource::Classic,
            initial_index: 0,
            seed: None,
        }
    }
}

impl Config {
    pub fn tick_interval(&self) -> Result<Duration, EngineError> {
        if self.tick_ms == 0 {
            return Err(EngineError::InvalidConfig(
                "tick_ms must be at least 1".to_string(),
            ));
        }
        Ok(Duration::from_millis(self.tick_ms))
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            policy: self.policy,
            initial_index: self.initial_index,
            seed: self.seed,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "ratecatch") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("ratecatch_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Config::default(),
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "ignoring malformed config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}
