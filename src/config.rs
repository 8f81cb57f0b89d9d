//! Configuration for the `nativeterm` binary.
//!
//! Loaded from `~/.nativeterm/config.toml`; every key is optional:
//!
//! ```toml
//! # Stream to query on Unix: "stdout" or "stderr"
//! stream = "stdout"
//!
//! # Enable ANSI escape processing before querying (Windows)
//! enable_ansi = false
//!
//! # tracing filter directive, e.g. "warn", "debug", "nativeterm=trace"
//! log_level = "warn"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use nativeterm::Stream;
use serde::{Deserialize, Serialize};

/// Main configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Stream whose terminal is queried
    pub stream: Stream,
    /// Enable virtual-terminal processing first
    pub enable_ansi: bool,
    /// Log filter
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stream: Stream::Stdout,
            enable_ansi: false,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load from the default location; a missing file yields the defaults
    pub fn load() -> anyhow::Result<Self> {
        match Self::get_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit path
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config: {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get config file path
    fn get_config_path() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".nativeterm").join("config.toml"))
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}
