//! Pipeline-specific error types.

use crate::pipeline::id::{NodeId, SlotId};
use crate::pipeline::port::{Arity, InputShape};
use thiserror::Error;

/// Which kind of group a configuration error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Series,
    Parallel,
}

impl std::fmt::Display for GroupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupKind::Series => write!(f, "series"),
            GroupKind::Parallel => write!(f, "parallel"),
        }
    }
}

/// Raised by the compiler. Never deferred to `run`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("empty {kind} group at {path}")]
    EmptyGroup { kind: GroupKind, path: String },

    #[error("at {path}: `{upstream}` produces {produced} but `{downstream}` expects {expected}")]
    ArityMismatch {
        path: String,
        upstream: String,
        downstream: String,
        produced: Arity,
        expected: InputShape,
    },

    #[error(
        "at {path}: branches receive the same value but `{left}` expects {left_shape} \
         while `{right}` expects {right_shape}"
    )]
    IncompatibleBranches {
        path: String,
        left: String,
        left_shape: InputShape,
        right: String,
        right_shape: InputShape,
    },

    #[error("graph input is {input} but `{entry}` expects {expected}")]
    InputMismatch {
        entry: String,
        input: Arity,
        expected: InputShape,
    },
}

/// Failure reported by a block's `process`.
#[derive(Error, Debug)]
pub enum BlockError {
    #[error("expected {expected}, got {found}")]
    UnexpectedValue {
        expected: &'static str,
        found: &'static str,
    },

    #[error("expected a {expected}-tuple, got {found} values")]
    TupleLength { expected: usize, found: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("script error: {0}")]
    Script(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BlockError {
    /// Wrap an arbitrary error so callers can downcast it later.
    pub fn custom<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        BlockError::Other(anyhow::Error::new(error))
    }

    /// Downcast a custom error back to its concrete type.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        match self {
            BlockError::Other(e) => e.downcast_ref::<E>(),
            _ => None,
        }
    }
}

pub type BlockResult<T> = std::result::Result<T, BlockError>;

/// Raised during `run`. The pass is abandoned with no partial output.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("block `{block}` ({node}) failed: {source}")]
    Block {
        block: String,
        node: NodeId,
        #[source]
        source: BlockError,
    },

    /// The block returned a value whose arity differs from `produces()`.
    /// Downstream shape checks were made against the declaration.
    #[error("block `{block}` ({node}) declares {declared} output but returned {returned}")]
    OutputArity {
        block: String,
        node: NodeId,
        declared: Arity,
        returned: Arity,
    },

    #[error("hook #{index} of block `{block}` ({node}) failed: {source}")]
    Hook {
        block: String,
        node: NodeId,
        index: usize,
        #[source]
        source: anyhow::Error,
    },
}

impl ExecutionError {
    /// Name of the block that failed (or whose hook failed).
    pub fn block(&self) -> &str {
        match self {
            ExecutionError::Block { block, .. }
            | ExecutionError::OutputArity { block, .. }
            | ExecutionError::Hook { block, .. } => block,
        }
    }

    pub fn node(&self) -> NodeId {
        match self {
            ExecutionError::Block { node, .. }
            | ExecutionError::OutputArity { node, .. }
            | ExecutionError::Hook { node, .. } => *node,
        }
    }
}

/// Errors that can occur within the pipeline system.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Slot {0:?} read before it was written")]
    SlotEmpty(SlotId),

    #[error("Unknown block: {0}")]
    UnknownBlock(String),
}

impl PipelineError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, PipelineError::Configuration(_))
    }

    pub fn as_execution(&self) -> Option<&ExecutionError> {
        match self {
            PipelineError::Execution(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_configuration(&self) -> Option<&ConfigurationError> {
        match self {
            PipelineError::Configuration(e) => Some(e),
            _ => None,
        }
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
