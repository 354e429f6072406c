//! Graph executor: one synchronous forward pass per `run`.
//!
//! Each pass:
//! 1. Store the input in slot 0.
//! 2. Walk the compiled steps in order. A `Process` step runs one block,
//!    checks the output against the block's declared arity, then fires that
//!    block's hooks before anything downstream sees the output.
//! 3. Move the output slot out and reset every slot.
//!
//! The first block or hook error abandons the pass. Slots are reset on
//! both paths so no value survives into the next pass.

use crate::pipeline::block::{AnyBlock, Block};
use crate::pipeline::bridge::TopologySnapshot;
use crate::pipeline::compiled_plan::{CompiledPlan, Operand, Step};
use crate::pipeline::compiler::GraphCompiler;
use crate::pipeline::description::Description;
use crate::pipeline::error::{
    BlockError, BlockResult, ExecutionError, PipelineError, PipelineResult,
};
use crate::pipeline::hook::HookRegistry;
use crate::pipeline::id::{NodeId, SlotId};
use crate::pipeline::passthrough::splice;
use crate::pipeline::port::{Arity, InputShape};
use crate::pipeline::value::Value;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Instant;

const DEFAULT_GRAPH_NAME: &str = "graph";

/// Executor tuning. Has no effect on computed values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorSettings {
    /// Emit a `trace!` event with every block output.
    pub trace_blocks: bool,
    /// Warn when a pass takes longer than this many microseconds.
    pub slow_pass_warn_us: Option<u64>,
}

/// A block placed in a compiled graph.
pub struct GraphNode {
    pub(crate) block: AnyBlock,
    /// Display name (node override or block name)
    pub(crate) name: String,
    /// Name qualified by the enclosing named passthroughs
    pub(crate) path: String,
}

impl GraphNode {
    pub fn block(&self) -> &AnyBlock {
        &self.block
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphNode")
            .field("path", &self.path)
            .field("block", &self.block.name())
            .finish()
    }
}

/// A compiled, executable graph.
pub struct Graph {
    nodes: Vec<GraphNode>,
    hooks: HookRegistry,
    plan: CompiledPlan,
    slots: Vec<Option<Value>>,
    passes: u64,
    settings: ExecutorSettings,
    name: String,
}

impl Graph {
    pub(crate) fn from_parts(
        nodes: Vec<GraphNode>,
        hooks: HookRegistry,
        plan: CompiledPlan,
        settings: ExecutorSettings,
    ) -> Self {
        let slots = vec![None; plan.slot_count];
        Self {
            nodes,
            hooks,
            plan,
            slots,
            passes: 0,
            settings,
            name: DEFAULT_GRAPH_NAME.to_string(),
        }
    }

    /// Compile `description` with default settings.
    pub fn compile(description: impl Into<Description>) -> PipelineResult<Self> {
        GraphCompiler::new().compile(description)
    }

    /// Name used when this graph is nested in a larger description.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Run one pass.
    pub fn run(&mut self, input: impl Into<Value>) -> PipelineResult<Value> {
        let start = self.settings.slow_pass_warn_us.map(|_| Instant::now());

        self.slots[SlotId::INPUT.index()] = Some(input.into());
        let result = self.execute();
        self.slots.iter_mut().for_each(|slot| *slot = None);

        if result.is_ok() {
            self.passes += 1;
        }
        if let (Some(start), Some(budget)) = (start, self.settings.slow_pass_warn_us) {
            let elapsed = start.elapsed().as_micros() as u64;
            if elapsed > budget {
                tracing::warn!(
                    "Pass {} of {} took {}us (budget {}us)",
                    self.passes,
                    self.name,
                    elapsed,
                    budget
                );
            }
        }
        result
    }

    fn execute(&mut self) -> PipelineResult<Value> {
        let Graph {
            nodes,
            hooks,
            plan,
            slots,
            settings,
            ..
        } = self;

        for step in &plan.steps {
            let value = match step {
                Step::Process { node, input, .. } => {
                    let graph_node = &mut nodes[node.index()];
                    let output = {
                        let input = fetch(slots, *input)?;
                        graph_node.block.process(&input)
                    }
                    .map_err(|source| ExecutionError::Block {
                        block: graph_node.path.clone(),
                        node: *node,
                        source,
                    })?;

                    let declared = graph_node.block.produces();
                    if output.arity() != declared {
                        return Err(ExecutionError::OutputArity {
                            block: graph_node.path.clone(),
                            node: *node,
                            declared,
                            returned: output.arity(),
                        }
                        .into());
                    }

                    if settings.trace_blocks {
                        tracing::trace!(block = %graph_node.path, "output: {:?}", output);
                    }

                    hooks.fire(*node, &output).map_err(|(index, source)| {
                        ExecutionError::Hook {
                            block: graph_node.path.clone(),
                            node: *node,
                            index,
                            source,
                        }
                    })?;
                    output
                }
                Step::Collect { inputs, .. } => Value::Tuple(
                    inputs
                        .iter()
                        .map(|op| fetch_owned(slots, *op))
                        .collect::<PipelineResult<Vec<_>>>()?,
                ),
                Step::Splice {
                    original,
                    derived,
                    flatten,
                    ..
                } => {
                    let original = fetch_owned(slots, *original)?;
                    let derived = fetch_owned(slots, *derived)?;
                    splice(original, derived, *flatten)
                }
            };
            slots[step.output().index()] = Some(value);
        }

        slots[plan.output.index()]
            .take()
            .ok_or(PipelineError::SlotEmpty(plan.output))
    }

    // ── State ──

    /// Reset the internal state of every block.
    pub fn clear(&mut self) {
        for node in &mut self.nodes {
            node.block.clear();
        }
        tracing::debug!("Cleared {} blocks of {}", self.nodes.len(), self.name);
    }

    /// Reset the internal state of one block.
    pub fn clear_block(&mut self, name: &str) -> PipelineResult<()> {
        let block = self
            .block_mut(name)
            .ok_or_else(|| PipelineError::UnknownBlock(name.to_string()))?;
        block.clear();
        Ok(())
    }

    // ── Lookup ──

    /// Resolve a block by scoped path (`"outer/inner"`), then by bare name.
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.path == name)
            .or_else(|| self.nodes.iter().position(|n| n.name == name))
            .map(|index| NodeId(index as u32))
    }

    pub fn block(&self, name: &str) -> Option<&AnyBlock> {
        self.node_id(name).map(|id| &self.nodes[id.index()].block)
    }

    pub fn block_mut(&mut self, name: &str) -> Option<&mut AnyBlock> {
        self.node_id(name).map(|id| &mut self.nodes[id.index()].block)
    }

    /// Block paths in traversal order.
    pub fn named_blocks(&self) -> impl Iterator<Item = (&str, &AnyBlock)> {
        self.nodes.iter().map(|n| (n.path.as_str(), &n.block))
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub(crate) fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn plan(&self) -> &CompiledPlan {
        &self.plan
    }

    /// Number of passes completed successfully.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    pub fn topology(&self) -> TopologySnapshot {
        TopologySnapshot::of(self)
    }
}

fn fetch(slots: &mut [Option<Value>], operand: Operand) -> PipelineResult<Cow<'_, Value>> {
    let slot = &mut slots[operand.slot.index()];
    if operand.take {
        slot.take()
            .map(Cow::Owned)
            .ok_or(PipelineError::SlotEmpty(operand.slot))
    } else {
        slot.as_ref()
            .map(Cow::Borrowed)
            .ok_or(PipelineError::SlotEmpty(operand.slot))
    }
}

fn fetch_owned(slots: &mut [Option<Value>], operand: Operand) -> PipelineResult<Value> {
    fetch(slots, operand).map(Cow::into_owned)
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("name", &self.name)
            .field("nodes", &self.nodes)
            .field("hooks", &self.hooks)
            .field("passes", &self.passes)
            .finish()
    }
}

/// A compiled graph nests as a single block.
impl Block for Graph {
    fn name(&self) -> &str {
        &self.name
    }

    fn accepts(&self) -> InputShape {
        self.plan.input_shape
    }

    fn produces(&self) -> Arity {
        self.plan.output_arity
    }

    fn process(&mut self, input: &Value) -> BlockResult<Value> {
        self.run(input.clone())
            .map_err(|e| BlockError::Other(anyhow::Error::new(e)))
    }

    fn clear(&mut self) {
        Graph::clear(self);
    }
}
