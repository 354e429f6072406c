//! Engine settings loaded from `settings.toml`
//!
//! # Main Types
//!
//! - [`EngineSettings`] - Top-level settings file
//! - [`LoggingSettings`] - Log filter, optional log file and ANSI output
//! - [`ScriptSettings`] - Limits for Rhai expression blocks
//!
//! Executor tuning lives in [`ExecutorSettings`] next to the executor.
//! Every field has a default, so a partial file (or no file) is valid.

use crate::pipeline::executor::ExecutorSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default log filter directive
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default Rhai operation budget per script evaluation
pub const DEFAULT_MAX_OPERATIONS: u64 = 1_000_000;

/// Default Rhai call stack depth
pub const DEFAULT_MAX_CALL_LEVELS: usize = 32;

/// Default largest array a script may build
pub const DEFAULT_MAX_ARRAY_SIZE: usize = 100_000;

/// Top-level engine settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub logging: LoggingSettings,
    pub script: ScriptSettings,
    pub executor: ExecutorSettings,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, e.g. `"info,daqflow::pipeline=debug"`.
    /// `RUST_LOG` takes precedence when set.
    pub filter: String,

    /// Also write logs to this file
    pub log_file: Option<PathBuf>,

    /// Colored terminal output
    pub ansi: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            log_file: None,
            ansi: true,
        }
    }
}

/// Safety limits for script blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
    pub max_operations: u64,
    pub max_call_levels: usize,
    pub max_array_size: usize,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            max_operations: DEFAULT_MAX_OPERATIONS,
            max_call_levels: DEFAULT_MAX_CALL_LEVELS,
            max_array_size: DEFAULT_MAX_ARRAY_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_settings_default() {
        let settings = EngineSettings::default();
        assert_eq!(settings.logging.filter, "info");
        assert!(settings.logging.ansi);
        assert_eq!(settings.script.max_operations, DEFAULT_MAX_OPERATIONS);
        assert!(!settings.executor.trace_blocks);
    }

    #[test]
    fn test_partial_toml() {
        let settings: EngineSettings = toml::from_str(
            r#"
            [logging]
            filter = "debug"

            [executor]
            slow_pass_warn_us = 500
            "#,
        )
        .unwrap();
        assert_eq!(settings.logging.filter, "debug");
        assert!(settings.logging.ansi);
        assert_eq!(settings.executor.slow_pass_warn_us, Some(500));
        assert_eq!(settings.script, ScriptSettings::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut settings = EngineSettings::default();
        settings.logging.log_file = Some(PathBuf::from("/tmp/daqflow.log"));
        settings.script.max_call_levels = 8;

        let text = toml::to_string_pretty(&settings).unwrap();
        let parsed: EngineSettings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }
}
