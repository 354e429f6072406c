//! Block pipeline composition and execution.
//!
//! A caller describes a pipeline once as a tree of blocks grouped in series
//! and parallel, optionally forking values through passthroughs. The
//! compiler validates the tree and turns it into a fixed `Graph`; the caller
//! then runs one synchronous pass per new input.
//!
//! # Architecture
//!
//! ```text
//! Description ──► GraphCompiler ──► Graph ──run(x)──► Value
//!                  (validate,         │
//!                   emit, liveness)   └── hooks ──► ChannelHook ──► TapBridge
//! ```
//!
//! # Design
//!
//! - **Explicit description variants**: `Leaf`, `Series`, `Parallel` and
//!   `Passthrough`; tuples never stand in for parallel groups.
//! - **Fail at compile time**: arity mismatches, empty groups and
//!   incompatible branches never reach `run`.
//! - **Enum dispatch on hot path**: `BuiltinBlock` for shipped blocks,
//!   `Box<dyn Block>` only for user blocks.
//! - **Flat plan over slots**: values move along the last read of each slot
//!   and are cloned only where a value really fans out.
//!
//! ```
//! use daqflow::pipeline::{passthrough, Graph, Value};
//! use daqflow::pipeline::blocks::Callable;
//! use daqflow::{parallel, series};
//!
//! let add_one = Callable::map("add_one", |x| x + 1.0);
//! let times_two = Callable::map("times_two", |x| x * 2.0);
//! let mut graph = Graph::compile(series![
//!     add_one,
//!     passthrough(parallel![times_two, Callable::map("neg", |x| -x)]),
//! ])
//! .unwrap();
//!
//! assert_eq!(graph.run(3.0).unwrap(), Value::tuple([4.0, 8.0, -4.0]));
//! ```

pub mod block;
pub mod blocks;
pub mod bridge;
pub mod compiled_plan;
pub mod compiler;
pub mod description;
pub mod error;
pub mod executor;
pub mod hook;
pub mod id;
pub mod passthrough;
pub mod port;
pub mod segment;
pub mod value;

pub use block::{AnyBlock, Block, BuiltinBlock, Node};
pub use bridge::{ChannelHook, NodeSnapshot, Tap, TapBridge, TopologySnapshot};
pub use compiled_plan::{CompiledPlan, Edge, Endpoint, PlanStats, Step};
pub use compiler::GraphCompiler;
pub use description::{block, parallel, passthrough, series, Description};
pub use error::{
    BlockError, BlockResult, ConfigurationError, ExecutionError, GroupKind, PipelineError,
    PipelineResult,
};
pub use executor::{ExecutorSettings, Graph, GraphNode};
pub use hook::{observer, Hook, HookRegistry, TraceHook};
pub use id::{NodeId, SlotId};
pub use passthrough::{Passthrough, PassthroughMode};
pub use port::{Arity, InputShape};
pub use segment::{segment, segment_indices};
pub use value::{Signal, Value};
