//! Pipeline descriptions loaded from TOML or JSON files
//!
//! The file format mirrors the description grammar. Every node is one of:
//!
//! - `{ series = [ ... ] }`
//! - `{ parallel = [ ... ] }`
//! - `{ passthrough = <node>, expand = true, name = "..." }`
//! - `{ block = "<kind>", <params>, name = "...", trace = false }`
//!
//! Block kinds are the built-ins that can be configured without code:
//! `windower`, `filter`, `centerer`, `ensure_2d` and `script`.
//!
//! # Example
//!
//! ```toml
//! name = "emg"
//!
//! [pipeline]
//! series = [
//!     { block = "windower", length = 200 },
//!     { block = "filter", b = [0.25, 0.25, 0.25, 0.25] },
//!     { passthrough = { block = "script", source = "rms(x[0])" }, name = "power" },
//! ]
//! ```
//!
//! Loading is one-way: a compiled graph is never written back.

use crate::error::{DaqflowError, Result, ResultExt};
use crate::pipeline::block::Node;
use crate::pipeline::blocks::{Centerer, Ensure2D, Filter, Orientation, Script, Windower};
use crate::pipeline::compiler::GraphCompiler;
use crate::pipeline::description::Description;
use crate::pipeline::executor::{ExecutorSettings, Graph};
use crate::pipeline::hook::TraceHook;
use crate::pipeline::passthrough::{Passthrough, PassthroughMode};
use crate::pipeline::port::{Arity, InputShape};
use crate::scripting::ScriptEngine;
use serde::Deserialize;
use std::path::Path;

/// A pipeline file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PipelineSpec {
    /// Name given to the compiled graph
    #[serde(default)]
    pub name: Option<String>,

    /// Tuple size of the values the caller will feed; validated at compile
    /// time when present
    #[serde(default)]
    pub input_tuple: Option<usize>,

    pub pipeline: SpecNode,
}

/// One node of a pipeline file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SpecNode {
    Series {
        series: Vec<SpecNode>,
    },
    Parallel {
        parallel: Vec<SpecNode>,
    },
    Passthrough {
        passthrough: Box<SpecNode>,
        #[serde(default = "default_true")]
        expand: bool,
        #[serde(default)]
        name: Option<String>,
    },
    Block(BlockEntry),
}

fn default_true() -> bool {
    true
}

/// A leaf block with its display options
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlockEntry {
    #[serde(flatten)]
    pub kind: BlockSpec,

    #[serde(default)]
    pub name: Option<String>,

    /// Attach a `TraceHook` to this block
    #[serde(default)]
    pub trace: bool,
}

/// Built-in block kinds and their constructor parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "block", rename_all = "snake_case")]
pub enum BlockSpec {
    Windower {
        length: usize,
    },
    Filter {
        b: Vec<f64>,
        #[serde(default)]
        a: Vec<f64>,
        #[serde(default)]
        overlap: usize,
    },
    Centerer,
    #[serde(rename = "ensure_2d")]
    Ensure2D {
        #[serde(default)]
        orientation: Orientation,
    },
    Script {
        source: String,
        /// Tuple size the script expects as `x` (single value if absent)
        #[serde(default)]
        inputs: Option<usize>,
        /// Tuple size the script returns (single value if absent)
        #[serde(default)]
        outputs: Option<usize>,
    },
}

impl BlockSpec {
    /// Kind name as written in pipeline files.
    pub fn kind_name(&self) -> &'static str {
        match self {
            BlockSpec::Windower { .. } => "windower",
            BlockSpec::Filter { .. } => "filter",
            BlockSpec::Centerer => "centerer",
            BlockSpec::Ensure2D { .. } => "ensure_2d",
            BlockSpec::Script { .. } => "script",
        }
    }
}

impl PipelineSpec {
    /// Parse a TOML pipeline file
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| DaqflowError::Config(format!("Failed to parse pipeline: {}", e)))
    }

    /// Parse a JSON pipeline file
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| DaqflowError::Config(format!("Failed to parse pipeline: {}", e)))
    }

    /// Load a pipeline file from disk. `.json` files are read as JSON,
    /// everything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DaqflowError::Config(format!("Failed to read pipeline file {:?}: {}", path, e))
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let spec = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        };
        spec.with_context(|| path.display().to_string())
    }

    /// Build the description tree. Script blocks are compiled with
    /// `engine`; syntax errors surface here.
    pub fn into_description(self, engine: &ScriptEngine) -> Result<Description> {
        self.pipeline.into_description(engine)
    }

    /// Build and compile the pipeline.
    pub fn compile(self, engine: &ScriptEngine, settings: ExecutorSettings) -> Result<Graph> {
        let mut compiler = GraphCompiler::new().settings(settings);
        if let Some(n) = self.input_tuple {
            compiler = compiler.expect_input(Arity::Tuple(n));
        }
        let name = self.name.clone();
        let graph = compiler.compile(self.into_description(engine)?)?;
        Ok(match name {
            Some(name) => graph.with_name(name),
            None => graph,
        })
    }
}

impl SpecNode {
    pub fn into_description(self, engine: &ScriptEngine) -> Result<Description> {
        Ok(match self {
            SpecNode::Series { series } => Description::Series(convert_all(series, engine)?),
            SpecNode::Parallel { parallel } => {
                Description::Parallel(convert_all(parallel, engine)?)
            }
            SpecNode::Passthrough {
                passthrough,
                expand,
                name,
            } => {
                let mode = if expand {
                    PassthroughMode::Expand
                } else {
                    PassthroughMode::Nested
                };
                let mut p = Passthrough::new(passthrough.into_description(engine)?).mode(mode);
                if let Some(name) = name {
                    p = p.named(name);
                }
                p.into()
            }
            SpecNode::Block(entry) => entry.into_node(engine)?.into(),
        })
    }
}

fn convert_all(nodes: Vec<SpecNode>, engine: &ScriptEngine) -> Result<Vec<Description>> {
    nodes
        .into_iter()
        .map(|node| node.into_description(engine))
        .collect()
}

impl BlockEntry {
    fn into_node(self, engine: &ScriptEngine) -> Result<Node> {
        let label = self
            .name
            .clone()
            .unwrap_or_else(|| self.kind.kind_name().to_string());

        let mut node = match self.kind {
            BlockSpec::Windower { length } => {
                if length == 0 {
                    return Err(DaqflowError::Config(format!(
                        "windower `{}` needs a positive length",
                        label
                    )));
                }
                Node::new(Windower::new(length))
            }
            BlockSpec::Filter { b, a, overlap } => Node::new(Filter::new(b, a, overlap)?),
            BlockSpec::Centerer => Node::new(Centerer::new()),
            BlockSpec::Ensure2D { orientation } => Node::new(Ensure2D::new(orientation)),
            BlockSpec::Script {
                source,
                inputs,
                outputs,
            } => {
                let mut script = Script::new(engine, label.clone(), &source)?;
                if let Some(n) = inputs {
                    script = script.accepting(InputShape::Tuple(n));
                }
                if let Some(n) = outputs {
                    script = script.producing(Arity::Tuple(n));
                }
                Node::new(script)
            }
        };

        if let Some(name) = self.name {
            node = node.named(name);
        }
        if self.trace {
            let label = node.name().to_string();
            node = node.with_hook(TraceHook::new(label));
        }
        Ok(node)
    }
}
