//! Configuration module for daqflow
//!
//! This module handles two kinds of files:
//! - Engine settings (`settings.toml`): logging, script limits, executor tuning
//! - Pipeline files (`.toml` or `.json`): a description of the graph to build
//!
//! # Settings Location
//!
//! Settings are read from the platform-appropriate config directory unless
//! a path is given explicitly:
//! - **Linux**: `~/.config/dev.hxyulin.daqflow/settings.toml`
//! - **macOS**: `~/Library/Application Support/dev.hxyulin.daqflow/settings.toml`
//! - **Windows**: `%APPDATA%\dev.hxyulin.daqflow\settings.toml`
//!
//! # Example
//!
//! ```no_run
//! use daqflow::config::{EngineSettings, PipelineSpec};
//! use daqflow::scripting::ScriptEngine;
//!
//! let (settings, load_error) = EngineSettings::load_or_default();
//! if let Some(e) = load_error {
//!     eprintln!("using default settings: {}", e);
//! }
//! let engine = ScriptEngine::with_settings(&settings.script);
//! let mut graph = PipelineSpec::load("emg.toml")?.compile(&engine, settings.executor)?;
//! # Ok::<(), daqflow::error::DaqflowError>(())
//! ```

pub mod settings;
pub mod spec;

pub use settings::*;
pub use spec::{BlockEntry, BlockSpec, PipelineSpec, SpecNode};

use crate::error::{DaqflowError, Result};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "dev.hxyulin.daqflow";

/// Settings filename
pub const SETTINGS_FILE: &str = "settings.toml";

// ==================== Config Directory ====================

/// Get the application config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default settings file
pub fn settings_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(SETTINGS_FILE))
}

impl EngineSettings {
    /// Load settings from the default location. A missing file yields the
    /// defaults.
    pub fn load() -> Result<Self> {
        let path = settings_path().ok_or_else(|| {
            DaqflowError::Config("Could not determine settings path".to_string())
        })?;

        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load settings from a file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DaqflowError::Config(format!("Failed to read settings {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            DaqflowError::Config(format!("Failed to parse settings {:?}: {}", path, e))
        })
    }

    /// Load settings, falling back to the defaults on any error.
    ///
    /// The error is handed back rather than logged, since settings are
    /// usually read before the subscriber is installed.
    pub fn load_or_default() -> (Self, Option<DaqflowError>) {
        Self::or_default(Self::load())
    }

    fn or_default(loaded: Result<Self>) -> (Self, Option<DaqflowError>) {
        match loaded {
            Ok(settings) => (settings, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<()> {
        let path = settings_path().ok_or_else(|| {
            DaqflowError::Config("Could not determine settings path".to_string())
        })?;
        self.save_to(path)
    }

    /// Save settings to a file as TOML
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DaqflowError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| DaqflowError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            DaqflowError::Config(format!("Failed to write settings {:?}: {}", path, e))
        })
    }
}
