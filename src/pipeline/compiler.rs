//! Compiles a graph description into an executable `Graph`.
//!
//! Compilation runs in two passes over the description tree:
//!
//! 1. **Validation** computes the shape of every sub-description (what it
//!    accepts, what it produces) and checks every adjacent pair of every
//!    series group. Nothing is moved; a failure leaves the description
//!    untouched and no block is ever invoked.
//! 2. **Emission** consumes the description, assigns `NodeId`s in traversal
//!    order, binds hooks, and lays out the flat step list over value slots.
//!
//! A final liveness pass walks the steps backwards and marks the last read
//! of every slot so the executor can move values instead of cloning them.

use super::block::Node;
use super::compiled_plan::{CompiledPlan, Edge, Endpoint, Operand, PlanStats, Step};
use super::description::Description;
use super::error::{ConfigurationError, GroupKind, PipelineResult};
use super::executor::{ExecutorSettings, Graph, GraphNode};
use super::hook::HookRegistry;
use super::id::{NodeId, SlotId};
use super::port::{Arity, InputShape};
use std::collections::{BTreeSet, HashSet};

const ROOT_PATH: &str = "root";

/// Validated shape of a sub-description.
#[derive(Debug, Clone, PartialEq)]
struct Shape {
    accepts: InputShape,
    output: Arity,
    label: String,
}

/// Compiles graph descriptions into executable graphs.
#[derive(Debug, Clone, Default)]
pub struct GraphCompiler {
    expected_input: Option<Arity>,
    settings: ExecutorSettings,
}

impl GraphCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the graph's entry blocks against the arity of the values
    /// the caller will present to `run`.
    pub fn expect_input(mut self, arity: Arity) -> Self {
        self.expected_input = Some(arity);
        self
    }

    pub fn settings(mut self, settings: ExecutorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Compile `description`.
    ///
    /// Fails with a `ConfigurationError` on an empty group, on any adjacent
    /// series pair whose arities do not fit, on parallel branches that can
    /// never receive the same value, and on an expected input the entry
    /// blocks do not accept.
    pub fn compile(&self, description: impl Into<Description>) -> PipelineResult<Graph> {
        let start_time = std::time::Instant::now();
        let description = description.into();

        let shape = validate(&description, ROOT_PATH)?;
        if let Some(input) = self.expected_input {
            if !shape.accepts.admits(input) {
                return Err(ConfigurationError::InputMismatch {
                    entry: shape.label,
                    input,
                    expected: shape.accepts,
                }
                .into());
            }
        }

        let mut emitter = Emitter::new();
        let (output, output_arity) = emitter.emit(description, SlotId::INPUT, "");
        debug_assert_eq!(output_arity, shape.output);

        let Emitter {
            mut steps,
            nodes,
            hooks,
            next_slot,
        } = emitter;

        let (moves, shared_reads) = mark_last_reads(&mut steps, output, next_slot as usize);
        let edges = collect_edges(&steps, output, next_slot as usize);

        warn_duplicate_names(&nodes);

        let stats = PlanStats {
            blocks: nodes.len(),
            steps: steps.len(),
            slots: next_slot as usize,
            edges: edges.len(),
            hooks: hooks.total(),
            moves,
            shared_reads,
            compile_time_us: start_time.elapsed().as_micros() as u64,
        };

        tracing::info!(
            "Compiled graph {}: {} blocks, {} steps, {} slots, {} hooks in {}us",
            shape.label,
            stats.blocks,
            stats.steps,
            stats.slots,
            stats.hooks,
            stats.compile_time_us
        );
        for (index, step) in steps.iter().enumerate() {
            tracing::debug!("step {}: {:?}", index, step);
        }

        let plan = CompiledPlan {
            steps,
            output,
            slot_count: next_slot as usize,
            edges,
            input_shape: shape.accepts,
            output_arity: shape.output,
            stats,
        };

        Ok(Graph::from_parts(nodes, hooks, plan, self.settings))
    }
}

// ── Pass 1: validation ──

fn validate(description: &Description, path: &str) -> Result<Shape, ConfigurationError> {
    match description {
        Description::Leaf(node) => Ok(leaf_shape(node)),

        Description::Series(items) => {
            let shapes = validate_group(items, GroupKind::Series, path)?;
            if let [only] = shapes.as_slice() {
                return Ok(only.clone());
            }
            for pair in shapes.windows(2) {
                let (upstream, downstream) = (&pair[0], &pair[1]);
                if !downstream.accepts.admits(upstream.output) {
                    return Err(ConfigurationError::ArityMismatch {
                        path: path.to_string(),
                        upstream: upstream.label.clone(),
                        downstream: downstream.label.clone(),
                        produced: upstream.output,
                        expected: downstream.accepts,
                    });
                }
            }
            // `validate_group` never returns an empty list.
            let accepts = shapes.first().map(|s| s.accepts).unwrap_or_default();
            let output = shapes.last().map(|s| s.output).unwrap_or(Arity::Single);
            Ok(Shape {
                accepts,
                output,
                label: description.label(),
            })
        }

        Description::Parallel(items) => {
            let shapes = validate_group(items, GroupKind::Parallel, path)?;
            if let [only] = shapes.as_slice() {
                return Ok(only.clone());
            }
            let accepts = intersect_branches(&shapes, path)?;
            Ok(Shape {
                accepts,
                output: Arity::Tuple(shapes.len()),
                label: description.label(),
            })
        }

        Description::Passthrough(p) => {
            let inner_path = format!("{}/passthrough", path);
            let inner = validate(p.inner(), &inner_path)?;
            Ok(Shape {
                accepts: inner.accepts,
                output: p.passthrough_mode().output_arity(inner.output),
                label: description.label(),
            })
        }
    }
}

fn leaf_shape(node: &Node) -> Shape {
    Shape {
        accepts: node.block.accepts(),
        output: node.block.produces(),
        label: node.name().to_string(),
    }
}

fn validate_group(
    items: &[Description],
    kind: GroupKind,
    path: &str,
) -> Result<Vec<Shape>, ConfigurationError> {
    if items.is_empty() {
        return Err(ConfigurationError::EmptyGroup {
            kind,
            path: path.to_string(),
        });
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let child = match kind {
                GroupKind::Series => format!("{}[{}]", path, i),
                GroupKind::Parallel => format!("{}({})", path, i),
            };
            validate(item, &child)
        })
        .collect()
}

/// Combine the input requirements of branches that all receive the same
/// value.
fn intersect_branches(shapes: &[Shape], path: &str) -> Result<InputShape, ConfigurationError> {
    let mut combined = InputShape::Any;
    let mut constrained_by: Option<&Shape> = None;

    for shape in shapes {
        match combined.intersect(shape.accepts) {
            Some(next) => {
                if next != combined {
                    constrained_by = Some(shape);
                }
                combined = next;
            }
            None => {
                let left = constrained_by.unwrap_or(shape);
                return Err(ConfigurationError::IncompatibleBranches {
                    path: path.to_string(),
                    left: left.label.clone(),
                    left_shape: combined,
                    right: shape.label.clone(),
                    right_shape: shape.accepts,
                });
            }
        }
    }
    Ok(combined)
}

// ── Pass 2: emission ──

struct Emitter {
    steps: Vec<Step>,
    nodes: Vec<GraphNode>,
    hooks: HookRegistry,
    next_slot: u32,
}

impl Emitter {
    fn new() -> Self {
        Self {
            steps: Vec::new(),
            nodes: Vec::new(),
            hooks: HookRegistry::new(),
            // Slot 0 is the graph input.
            next_slot: 1,
        }
    }

    fn alloc(&mut self) -> SlotId {
        let slot = SlotId(self.next_slot);
        self.next_slot += 1;
        slot
    }

    /// Emit steps reading `input`; returns the slot holding the result and
    /// its arity.
    fn emit(&mut self, description: Description, input: SlotId, scope: &str) -> (SlotId, Arity) {
        match description {
            Description::Leaf(node) => self.emit_leaf(node, input, scope),

            Description::Series(items) => {
                let mut current = (input, Arity::Single);
                for item in items {
                    current = self.emit(item, current.0, scope);
                }
                current
            }

            Description::Parallel(mut items) => {
                if items.len() == 1 {
                    if let Some(only) = items.pop() {
                        return self.emit(only, input, scope);
                    }
                }
                let count = items.len();
                let inputs = items
                    .into_iter()
                    .map(|item| Operand::read(self.emit(item, input, scope).0))
                    .collect();
                let output = self.alloc();
                self.steps.push(Step::Collect { inputs, output });
                (output, Arity::Tuple(count))
            }

            Description::Passthrough(p) => {
                let inner_scope = match p.name.as_deref() {
                    Some(name) => qualify(scope, name),
                    None => scope.to_string(),
                };
                let mode = p.mode;
                let (derived, inner_arity) = self.emit(*p.inner, input, &inner_scope);
                let output = self.alloc();
                self.steps.push(Step::Splice {
                    original: Operand::read(input),
                    derived: Operand::read(derived),
                    flatten: mode.flattens(inner_arity),
                    output,
                });
                (output, mode.output_arity(inner_arity))
            }
        }
    }

    fn emit_leaf(&mut self, node: Node, input: SlotId, scope: &str) -> (SlotId, Arity) {
        let id = NodeId(self.nodes.len() as u32);
        let name = node.name().to_string();
        let Node { block, hooks, .. } = node;
        let arity = block.produces();

        self.hooks.register(id, hooks);
        self.nodes.push(GraphNode {
            path: qualify(scope, &name),
            name,
            block,
        });

        let output = self.alloc();
        self.steps.push(Step::Process {
            node: id,
            input: Operand::read(input),
            output,
        });
        (output, arity)
    }
}

fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", scope, name)
    }
}

// ── Liveness and edges ──

/// Mark the last read of every slot. Returns `(moves, shared_reads)`.
fn mark_last_reads(steps: &mut [Step], output: SlotId, slot_count: usize) -> (usize, usize) {
    let mut read_later = vec![false; slot_count];
    // The executor moves the output out after the last step.
    read_later[output.index()] = true;

    let mut moves = 0;
    let mut shared_reads = 0;
    for step in steps.iter_mut().rev() {
        for operand in step.operands_mut().into_iter().rev() {
            let index = operand.slot.index();
            operand.take = !read_later[index];
            read_later[index] = true;
            if operand.take {
                moves += 1;
            } else {
                shared_reads += 1;
            }
        }
    }
    (moves, shared_reads)
}

/// Resolve block-to-block dependencies through collect/splice steps.
fn collect_edges(steps: &[Step], output: SlotId, slot_count: usize) -> Vec<Edge> {
    let mut sources: Vec<BTreeSet<Endpoint>> = vec![BTreeSet::new(); slot_count];
    sources[SlotId::INPUT.index()].insert(Endpoint::Input);

    let mut edges = BTreeSet::new();
    for step in steps {
        match step {
            Step::Process {
                node,
                input,
                output,
            } => {
                for &from in &sources[input.slot.index()] {
                    edges.insert(Edge {
                        from,
                        to: Endpoint::Node(*node),
                    });
                }
                sources[output.index()].insert(Endpoint::Node(*node));
            }
            Step::Collect { .. } | Step::Splice { .. } => {
                let merged: BTreeSet<Endpoint> = step
                    .operands()
                    .iter()
                    .flat_map(|op| sources[op.slot.index()].iter().copied())
                    .collect();
                sources[step.output().index()] = merged;
            }
        }
    }
    for &from in &sources[output.index()] {
        edges.insert(Edge {
            from,
            to: Endpoint::Output,
        });
    }

    let mut edges: Vec<Edge> = edges.into_iter().collect();
    edges.sort_by_key(|e| (endpoint_order(e.to), endpoint_order(e.from)));
    edges
}

fn endpoint_order(endpoint: Endpoint) -> (u8, u32) {
    match endpoint {
        Endpoint::Input => (0, 0),
        Endpoint::Node(id) => (1, id.0),
        Endpoint::Output => (2, 0),
    }
}

fn warn_duplicate_names(nodes: &[GraphNode]) {
    for name in ambiguous_names(nodes) {
        tracing::warn!(
            "Block name `{}` is used more than once; lookups return the first",
            name
        );
    }
}

/// Names that resolve to more than one block: repeated paths, and repeated
/// bare names that no path shadows.
fn ambiguous_names(nodes: &[GraphNode]) -> Vec<&str> {
    let paths: HashSet<&str> = nodes.iter().map(|n| n.path.as_str()).collect();
    let mut seen_paths = HashSet::new();
    let mut seen_names = HashSet::new();
    let mut ambiguous = BTreeSet::new();

    for node in nodes {
        if !seen_paths.insert(node.path.as_str()) {
            ambiguous.insert(node.path.as_str());
        }
        let name = node.name.as_str();
        if !seen_names.insert(name) && !paths.contains(name) {
            ambiguous.insert(name);
        }
    }
    ambiguous.into_iter().collect()
}
