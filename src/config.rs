use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Optional settings. Every key may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub title: Option<String>,
    pub export_dir: Option<PathBuf>,
}

impl Config {
    /// Reads the YAML file at `path`. A missing or malformed file yields
    /// the empty configuration.
    pub fn load(path: &Path) -> Self {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "no config file, using defaults");
                return Self::default();
            }
        };

        match serde_yaml::from_str::<Option<Config>>(&data) {
            Ok(config) => config.unwrap_or_default(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring malformed config");
                Self::default()
            }
        }
    }

    /// `name` inside `export_dir` when one is configured.
    pub fn export_path(&self, name: &str) -> PathBuf {
        match &self.export_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }
}
