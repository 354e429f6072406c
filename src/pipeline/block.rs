//! Block abstraction for the pipeline.
//!
//! Two-layer design:
//! - **`Block` trait**: user-defined blocks.
//! - **`BuiltinBlock` enum**: all built-in blocks. The compiler can inline
//!   match arms, eliminating dynamic dispatch overhead on the hot path.
//!
//! `AnyBlock` wraps either variant so the pipeline can handle both uniformly.
//! A block knows nothing about its position in the graph.

use crate::pipeline::blocks::{
    Callable, Centerer, Ensure2D, FeatureExtractor, Filter, Script, Windower,
};
use crate::pipeline::error::BlockResult;
use crate::pipeline::hook::Hook;
use crate::pipeline::port::{Arity, InputShape};
use crate::pipeline::value::Value;

/// Trait for user-defined blocks.
pub trait Block: Send {
    /// Human-readable name of this block.
    fn name(&self) -> &str;

    /// What this block accepts on its input.
    fn accepts(&self) -> InputShape {
        InputShape::Single
    }

    /// What this block produces.
    fn produces(&self) -> Arity {
        Arity::Single
    }

    /// Transform one input into one output.
    fn process(&mut self, input: &Value) -> BlockResult<Value>;

    /// Reset internal state. Stateless blocks do nothing.
    fn clear(&mut self) {}
}

/// Enum dispatch for built-in blocks.
pub enum BuiltinBlock {
    Callable(Callable),
    Windower(Windower),
    Filter(Filter),
    Centerer(Centerer),
    Ensure2D(Ensure2D),
    FeatureExtractor(FeatureExtractor),
    Script(Script),
}

impl BuiltinBlock {
    pub fn name(&self) -> &str {
        match self {
            BuiltinBlock::Callable(b) => b.name(),
            BuiltinBlock::Windower(b) => b.name(),
            BuiltinBlock::Filter(b) => b.name(),
            BuiltinBlock::Centerer(b) => b.name(),
            BuiltinBlock::Ensure2D(b) => b.name(),
            BuiltinBlock::FeatureExtractor(b) => b.name(),
            BuiltinBlock::Script(b) => b.name(),
        }
    }

    pub fn accepts(&self) -> InputShape {
        match self {
            BuiltinBlock::Callable(b) => b.accepts(),
            BuiltinBlock::Script(b) => b.accepts(),
            BuiltinBlock::Windower(_)
            | BuiltinBlock::Filter(_)
            | BuiltinBlock::Centerer(_)
            | BuiltinBlock::Ensure2D(_)
            | BuiltinBlock::FeatureExtractor(_) => InputShape::Single,
        }
    }

    pub fn produces(&self) -> Arity {
        match self {
            BuiltinBlock::Callable(b) => b.produces(),
            BuiltinBlock::Script(b) => b.produces(),
            BuiltinBlock::Windower(_)
            | BuiltinBlock::Filter(_)
            | BuiltinBlock::Centerer(_)
            | BuiltinBlock::Ensure2D(_)
            | BuiltinBlock::FeatureExtractor(_) => Arity::Single,
        }
    }

    pub fn process(&mut self, input: &Value) -> BlockResult<Value> {
        match self {
            BuiltinBlock::Callable(b) => b.process(input),
            BuiltinBlock::Windower(b) => b.process(input),
            BuiltinBlock::Filter(b) => b.process(input),
            BuiltinBlock::Centerer(b) => b.process(input),
            BuiltinBlock::Ensure2D(b) => b.process(input),
            BuiltinBlock::FeatureExtractor(b) => b.process(input),
            BuiltinBlock::Script(b) => b.process(input),
        }
    }

    pub fn clear(&mut self) {
        match self {
            BuiltinBlock::Windower(b) => b.clear(),
            BuiltinBlock::Filter(b) => b.clear(),
            BuiltinBlock::FeatureExtractor(b) => b.clear(),
            BuiltinBlock::Callable(_)
            | BuiltinBlock::Centerer(_)
            | BuiltinBlock::Ensure2D(_)
            | BuiltinBlock::Script(_) => {}
        }
    }
}

/// Wrapper that holds either a built-in block (enum dispatch) or a custom one (trait object).
pub enum AnyBlock {
    Builtin(BuiltinBlock),
    Custom(Box<dyn Block>),
}

impl AnyBlock {
    /// Box a user-defined block.
    pub fn custom<B: Block + 'static>(block: B) -> Self {
        AnyBlock::Custom(Box::new(block))
    }

    pub fn name(&self) -> &str {
        match self {
            AnyBlock::Builtin(b) => b.name(),
            AnyBlock::Custom(b) => b.name(),
        }
    }

    pub fn accepts(&self) -> InputShape {
        match self {
            AnyBlock::Builtin(b) => b.accepts(),
            AnyBlock::Custom(b) => b.accepts(),
        }
    }

    pub fn produces(&self) -> Arity {
        match self {
            AnyBlock::Builtin(b) => b.produces(),
            AnyBlock::Custom(b) => b.produces(),
        }
    }

    pub fn process(&mut self, input: &Value) -> BlockResult<Value> {
        match self {
            AnyBlock::Builtin(b) => b.process(input),
            AnyBlock::Custom(b) => b.process(input),
        }
    }

    pub fn clear(&mut self) {
        match self {
            AnyBlock::Builtin(b) => b.clear(),
            AnyBlock::Custom(b) => b.clear(),
        }
    }

    pub fn as_builtin(&self) -> Option<&BuiltinBlock> {
        match self {
            AnyBlock::Builtin(b) => Some(b),
            AnyBlock::Custom(_) => None,
        }
    }
}

impl From<Box<dyn Block>> for AnyBlock {
    fn from(block: Box<dyn Block>) -> Self {
        AnyBlock::Custom(block)
    }
}

impl From<BuiltinBlock> for AnyBlock {
    fn from(block: BuiltinBlock) -> Self {
        AnyBlock::Builtin(block)
    }
}

macro_rules! builtin_conversions {
    ($($variant:ident),+ $(,)?) => {
        $(
            impl From<$variant> for BuiltinBlock {
                fn from(block: $variant) -> Self {
                    BuiltinBlock::$variant(block)
                }
            }

            impl From<$variant> for AnyBlock {
                fn from(block: $variant) -> Self {
                    AnyBlock::Builtin(BuiltinBlock::$variant(block))
                }
            }

            impl From<$variant> for Node {
                fn from(block: $variant) -> Self {
                    Node::new(block)
                }
            }
        )+
    };
}

builtin_conversions!(Callable, Windower, Filter, Centerer, Ensure2D, FeatureExtractor, Script);

/// A block together with its display name and hook bindings.
///
/// Hooks are bound here, at construction, and never rebound once the node
/// has been compiled into a graph.
pub struct Node {
    pub(crate) block: AnyBlock,
    pub(crate) name: Option<String>,
    pub(crate) hooks: Vec<Box<dyn Hook>>,
}

impl Node {
    pub fn new(block: impl Into<AnyBlock>) -> Self {
        Self {
            block: block.into(),
            name: None,
            hooks: Vec::new(),
        }
    }

    /// Node around a user-defined block.
    pub fn custom<B: Block + 'static>(block: B) -> Self {
        Self::new(AnyBlock::custom(block))
    }

    /// Override the block's own name for lookups and error messages.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append a hook. Hooks fire in the order they were added.
    pub fn with_hook(mut self, hook: impl Hook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn with_hooks(mut self, hooks: impl IntoIterator<Item = Box<dyn Hook>>) -> Self {
        self.hooks.extend(hooks);
        self
    }

    /// Effective name: the override if set, else the block's own.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.block.name())
    }

    pub fn block(&self) -> &AnyBlock {
        &self.block
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }
}

impl From<AnyBlock> for Node {
    fn from(block: AnyBlock) -> Self {
        Node::new(block)
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name())
            .field("accepts", &self.block.accepts())
            .field("produces", &self.block.produces())
            .field("hooks", &self.hooks.len())
            .finish()
    }
}
