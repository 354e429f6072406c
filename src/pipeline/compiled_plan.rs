//! Compiled execution plan for a graph description.
//!
//! The plan is a flat list of steps over numbered value slots. Slot 0 holds
//! the graph input; every other slot is written by exactly one step. Steps
//! are in traversal order: that order is also the block and hook firing
//! order, fixed at compile time.

use crate::pipeline::id::{NodeId, SlotId};
use crate::pipeline::port::{Arity, InputShape};
use serde::Serialize;

/// A slot read by a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    pub slot: SlotId,
    /// Last read of this slot in the pass: the value may be moved out
    /// instead of cloned.
    pub take: bool,
}

impl Operand {
    pub(crate) fn read(slot: SlotId) -> Self {
        Self { slot, take: false }
    }
}

/// One unit of work in a pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Run a block on `input`, fire its hooks, store the result.
    Process {
        node: NodeId,
        input: Operand,
        output: SlotId,
    },
    /// Gather the outputs of parallel branches into a tuple.
    Collect {
        inputs: Vec<Operand>,
        output: SlotId,
    },
    /// Prepend a passthrough's original input to the inner output.
    Splice {
        original: Operand,
        derived: Operand,
        /// Splice a tuple-valued inner output element-wise.
        flatten: bool,
        output: SlotId,
    },
}

impl Step {
    pub fn output(&self) -> SlotId {
        match self {
            Step::Process { output, .. }
            | Step::Collect { output, .. }
            | Step::Splice { output, .. } => *output,
        }
    }

    /// Operands in the order the executor reads them.
    pub fn operands(&self) -> Vec<Operand> {
        match self {
            Step::Process { input, .. } => vec![*input],
            Step::Collect { inputs, .. } => inputs.clone(),
            Step::Splice {
                original, derived, ..
            } => vec![*original, *derived],
        }
    }

    pub(crate) fn operands_mut(&mut self) -> Vec<&mut Operand> {
        match self {
            Step::Process { input, .. } => vec![input],
            Step::Collect { inputs, .. } => inputs.iter_mut().collect(),
            Step::Splice {
                original, derived, ..
            } => vec![original, derived],
        }
    }
}

/// One end of a data dependency between blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// The value presented to `run`.
    Input,
    Node(NodeId),
    /// The value returned from `run`.
    Output,
}

/// Explicit edge of the compiled graph. Collect and splice steps are
/// transparent: an edge always joins blocks (or the graph's ports).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Edge {
    pub from: Endpoint,
    pub to: Endpoint,
}

/// Compiled execution plan.
#[derive(Debug, Clone)]
pub struct CompiledPlan {
    /// Steps in execution order
    pub steps: Vec<Step>,

    /// Slot holding the final output
    pub output: SlotId,

    /// Number of value slots, including the input slot
    pub slot_count: usize,

    /// Block-level data dependencies
    pub edges: Vec<Edge>,

    /// What the graph accepts
    pub input_shape: InputShape,

    /// What the graph produces
    pub output_arity: Arity,

    /// Compilation statistics
    pub stats: PlanStats,
}

/// Statistics about the compiled plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanStats {
    /// Number of blocks
    pub blocks: usize,

    /// Number of steps (blocks plus collect/splice steps)
    pub steps: usize,

    /// Number of value slots
    pub slots: usize,

    /// Number of explicit edges
    pub edges: usize,

    /// Total bound hooks
    pub hooks: usize,

    /// Slot reads that move their value
    pub moves: usize,

    /// Slot reads that clone or borrow their value
    pub shared_reads: usize,

    /// Compilation time in microseconds
    pub compile_time_us: u64,
}

impl CompiledPlan {
    /// Ids of the blocks in execution order.
    pub fn execution_order(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.steps.iter().filter_map(|step| match step {
            Step::Process { node, .. } => Some(*node),
            _ => None,
        })
    }
}
