//! Port shapes for the block system.
//!
//! Each block declares what it accepts on its input and what it produces on
//! its output. The compiler uses these to validate adjacent elements of a
//! series group before any data flows.

use serde::Serialize;
use std::fmt;

/// What a compiled unit hands to its downstream consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Arity {
    /// One consumable value.
    Single,
    /// An ordered tuple of `n` values (fan-in of a parallel group).
    Tuple(usize),
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Single => write!(f, "a single value"),
            Arity::Tuple(n) => write!(f, "a {}-tuple", n),
        }
    }
}

/// What a block is willing to receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum InputShape {
    /// A single value. The default for every block.
    #[default]
    Single,
    /// Exactly an `n`-tuple.
    Tuple(usize),
    /// A tuple of any length.
    AnyTuple,
    /// Anything.
    Any,
}

impl InputShape {
    /// Whether a producer of `arity` can feed this input.
    pub fn admits(self, arity: Arity) -> bool {
        match (self, arity) {
            (InputShape::Any, _) => true,
            (InputShape::Single, Arity::Single) => true,
            (InputShape::Tuple(n), Arity::Tuple(m)) => n == m,
            (InputShape::AnyTuple, Arity::Tuple(_)) => true,
            _ => false,
        }
    }

    /// The shape satisfying both requirements, if any.
    ///
    /// Used when several branches receive the same upstream value.
    pub fn intersect(self, other: InputShape) -> Option<InputShape> {
        use InputShape::*;
        match (self, other) {
            (Any, s) | (s, Any) => Some(s),
            (Single, Single) => Some(Single),
            (AnyTuple, AnyTuple) => Some(AnyTuple),
            (AnyTuple, Tuple(n)) | (Tuple(n), AnyTuple) => Some(Tuple(n)),
            (Tuple(n), Tuple(m)) if n == m => Some(Tuple(n)),
            _ => None,
        }
    }
}

impl fmt::Display for InputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputShape::Single => write!(f, "a single value"),
            InputShape::Tuple(n) => write!(f, "a {}-tuple", n),
            InputShape::AnyTuple => write!(f, "a tuple"),
            InputShape::Any => write!(f, "any value"),
        }
    }
}
