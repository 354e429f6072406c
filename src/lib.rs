//! # daqflow: Declarative Block Pipelines
//!
//! A processing engine for real-time data acquisition. A pipeline is
//! described once as a tree of blocks grouped in series and parallel,
//! compiled into a fixed graph, and then run once per incoming sample.
//!
//! ## Architecture
//!
//! - **Pipeline**: description grammar, compiler and executor (`pipeline`)
//! - **Blocks**: windowing, filtering, centering and feature extraction
//!   (`pipeline::blocks`)
//! - **Scripting**: Rhai-based expression blocks (`scripting`)
//! - **Configuration**: engine settings and pipeline files (`config`)
//! - **Communication**: crossbeam channels carry hook taps to display or
//!   storage threads (`pipeline::bridge`)
//!
//! ## Example
//!
//! ```
//! use daqflow::pipeline::blocks::Callable;
//! use daqflow::pipeline::{Graph, Value};
//! use daqflow::{parallel, series};
//!
//! let add_one = || Callable::map("add_one", |x| x + 1.0);
//! let times_two = Callable::map("times_two", |x| x * 2.0);
//!
//! let mut graph = Graph::compile(series![add_one(), parallel![add_one(), times_two]])?;
//! assert_eq!(graph.run(3.0)?, Value::tuple([5.0, 8.0]));
//! # Ok::<(), daqflow::pipeline::PipelineError>(())
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod scripting;

// Re-export commonly used types
pub use config::{EngineSettings, PipelineSpec};
pub use error::{DaqflowError, Result};
pub use pipeline::{Block, Description, Graph, GraphCompiler, Hook, Signal, Value};
pub use scripting::ScriptEngine;
