//! User configuration (`config.toml`).
//!
//! ```toml
//! auto_evaluate = false
//! tick_rate_ms = 50
//! log_file = "/tmp/evalpad.log"
//! log_level = "debug"
//!
//! [layout]
//! orientation = "stacked"
//! input_percent = 55
//! show_output = true
//! show_abort = true
//! ```
//!
//! Every key is optional. A missing file at the default location means
//! defaults; a missing file passed explicitly is an error.

use crate::error::ConfigError;
use crate::layout::ShellLayout;
use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "evalpad";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub auto_evaluate: bool,
    /// Key poll timeout of the UI loop
    pub tick_rate_ms: u64,
    pub log_file: Option<PathBuf>,
    pub log_level: LogLevel,
    pub layout: ShellLayout,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            auto_evaluate: false,
            tick_rate_ms: 50,
            log_file: None,
            log_level: LogLevel::Info,
            layout: ShellLayout::default(),
        }
    }
}

/// `$XDG_CONFIG_HOME/evalpad/config.toml`, falling back to `~/.config/evalpad/config.toml`
pub fn default_path() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(xdg).join(APP_DIR).join(CONFIG_FILE));
    }
    std::env::var_os("HOME")
        .filter(|v| !v.is_empty())
        .map(|home| PathBuf::from(home).join(".config").join(APP_DIR).join(CONFIG_FILE))
}

impl Config {
    /// Load `path`, or the default location when `None`
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_file(path),
            None => match default_path() {
                Some(path) if path.exists() => Self::load_file(&path),
                _ => Ok(Config::default()),
            },
        }
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parse TOML text; `origin` is only used in error messages
    pub fn parse(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate_ms == 0 {
            return Err(ConfigError::Invalid("tick_rate_ms must be positive".into()));
        }
        self.layout.validate()
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }
}
