//! Configuration loaded from a TOML file.
//!
//! ```toml
//! [runtime]
//! cores = 8
//!
//! [imports]
//! base_dir = "/srv/tools"
//! ```

use crate::error::{CwilError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default file looked up in the current directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "cwil.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub runtime: RuntimeConfig,
    pub imports: ImportConfig,
}

/// Values exposed to expressions as `runtime.*`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub cores: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { cores: 4 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Directory import paths are resolved against; the process working
    /// directory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] when
    /// no path is given. A missing default file yields the defaults; a
    /// missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => load_config(path, true),
            None => load_config(Path::new(DEFAULT_CONFIG_FILE), false),
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| CwilError::Config {
            message: format!("invalid TOML: {}", e),
        })
    }
}

fn load_config(path: &Path, required: bool) -> Result<Config> {
    match fs::read_to_string(path) {
        Ok(contents) => Config::from_toml(&contents).map_err(|e| CwilError::Config {
            message: format!("Failed to parse {}: {}", path.display(), e),
        }),
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => Ok(Config::default()),
        Err(err) if err.kind() == io::ErrorKind::IsADirectory => Err(CwilError::Config {
            message: format!(
                "Expected {} to be a TOML file, but found a directory",
                path.display()
            ),
        }),
        Err(err) => Err(CwilError::Config {
            message: format!("Failed to read {}: {}", path.display(), err),
        }),
    }
}
