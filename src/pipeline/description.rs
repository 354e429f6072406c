//! Graph descriptions.
//!
//! A description is an explicit tagged tree: leaves are blocks, `Series`
//! chains its elements, `Parallel` fans one value out to every element and
//! collects their outputs into a tuple, `Passthrough` forwards its input
//! alongside an inner description's output.
//!
//! Groups of one element degenerate to that element; in particular a
//! one-element parallel group is *not* wrapped in a one-tuple.

use crate::pipeline::block::{AnyBlock, Block, Node};
use crate::pipeline::blocks::{
    Callable, Centerer, Ensure2D, FeatureExtractor, Filter, Script, Windower,
};
use crate::pipeline::executor::Graph;
use crate::pipeline::passthrough::Passthrough;

#[derive(Debug)]
pub enum Description {
    Leaf(Node),
    Series(Vec<Description>),
    Parallel(Vec<Description>),
    Passthrough(Passthrough),
}

impl Description {
    /// Short human-readable rendering used in error messages:
    /// `[a, b]` for series, `(a, b)` for parallel groups.
    pub fn label(&self) -> String {
        match self {
            Description::Leaf(node) => node.name().to_string(),
            Description::Series(items) | Description::Parallel(items) if items.len() == 1 => {
                items[0].label()
            }
            Description::Series(items) => format!("[{}]", join_labels(items)),
            Description::Parallel(items) => format!("({})", join_labels(items)),
            Description::Passthrough(p) => match p.name() {
                Some(name) => name.to_string(),
                None => format!("passthrough({})", p.inner().label()),
            },
        }
    }

    /// Number of leaf blocks in the tree.
    pub fn block_count(&self) -> usize {
        match self {
            Description::Leaf(_) => 1,
            Description::Series(items) | Description::Parallel(items) => {
                items.iter().map(Description::block_count).sum()
            }
            Description::Passthrough(p) => p.inner().block_count(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Description::Leaf(_))
    }
}

fn join_labels(items: &[Description]) -> String {
    items
        .iter()
        .map(Description::label)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Leaf description around a block or node.
pub fn block(node: impl Into<Node>) -> Description {
    Description::Leaf(node.into())
}

/// Chain `items` so each output feeds the next element.
pub fn series(items: impl IntoIterator<Item = Description>) -> Description {
    Description::Series(items.into_iter().collect())
}

/// Fan one input out to every element of `items`.
pub fn parallel(items: impl IntoIterator<Item = Description>) -> Description {
    Description::Parallel(items.into_iter().collect())
}

/// Forward the input alongside the output of `inner`.
pub fn passthrough(inner: impl Into<Description>) -> Passthrough {
    Passthrough::new(inner)
}

impl From<Node> for Description {
    fn from(node: Node) -> Self {
        Description::Leaf(node)
    }
}

impl From<AnyBlock> for Description {
    fn from(block: AnyBlock) -> Self {
        Description::Leaf(Node::new(block))
    }
}

impl From<Box<dyn Block>> for Description {
    fn from(block: Box<dyn Block>) -> Self {
        Description::Leaf(Node::new(block))
    }
}

impl From<Passthrough> for Description {
    fn from(p: Passthrough) -> Self {
        Description::Passthrough(p)
    }
}

/// A compiled graph nests as a single leaf.
impl From<Graph> for Description {
    fn from(graph: Graph) -> Self {
        Description::Leaf(Node::custom(graph))
    }
}

macro_rules! leaf_conversions {
    ($($block:ident),+ $(,)?) => {
        $(
            impl From<$block> for Description {
                fn from(block: $block) -> Self {
                    Description::Leaf(Node::new(block))
                }
            }
        )+
    };
}

leaf_conversions!(Callable, Windower, Filter, Centerer, Ensure2D, FeatureExtractor, Script);

/// Build a series description: `series![a, b, c]`.
#[macro_export]
macro_rules! series {
    ($($item:expr),* $(,)?) => {
        $crate::pipeline::Description::Series(
            vec![$($crate::pipeline::Description::from($item)),*]
        )
    };
}

/// Build a parallel description: `parallel![a, b]`.
#[macro_export]
macro_rules! parallel {
    ($($item:expr),* $(,)?) => {
        $crate::pipeline::Description::Parallel(
            vec![$($crate::pipeline::Description::from($item)),*]
        )
    };
}
