//! Error handling for daqflow
//!
//! This module defines the crate-level error type and a Result alias used
//! outside the pipeline core. Pipeline compilation and execution keep their
//! own error types (`crate::pipeline::error`); they convert into
//! `DaqflowError` at the crate boundary.

use crate::pipeline::error::{BlockError, PipelineError};
use thiserror::Error;

/// Main error type for daqflow operations
#[derive(Error, Debug)]
pub enum DaqflowError {
    /// Graph compilation or execution failures
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Block construction failures (invalid filter coefficients etc.)
    #[error("Block error: {0}")]
    Block(#[from] BlockError),

    /// Errors related to Rhai script compilation or execution
    #[error("Script error: {0}")]
    Script(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument to a free function
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<DaqflowError>,
    },
}

impl DaqflowError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        DaqflowError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a script error from a Rhai error
    pub fn from_rhai_error(err: Box<rhai::EvalAltResult>) -> Self {
        DaqflowError::Script(err.to_string())
    }

    /// The innermost error, with all context layers removed.
    pub fn root(&self) -> &DaqflowError {
        match self {
            DaqflowError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<toml::de::Error> for DaqflowError {
    fn from(err: toml::de::Error) -> Self {
        DaqflowError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for DaqflowError {
    fn from(err: toml::ser::Error) -> Self {
        DaqflowError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for DaqflowError {
    fn from(err: serde_json::Error) -> Self {
        DaqflowError::Serialization(err.to_string())
    }
}

/// Result type alias for daqflow operations
pub type Result<T> = std::result::Result<T, DaqflowError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<DaqflowError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
