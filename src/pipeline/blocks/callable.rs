//! Callable: a block backed by a closure.
//!
//! For transforms that need no persistent attributes between passes. The
//! closure may still capture state; `clear` does not touch it.

use crate::pipeline::error::{BlockError, BlockResult};
use crate::pipeline::port::{Arity, InputShape};
use crate::pipeline::value::Value;

type ProcessFn = Box<dyn FnMut(&Value) -> BlockResult<Value> + Send>;

/// Block wrapping a `FnMut(&Value) -> BlockResult<Value>`.
pub struct Callable {
    name: String,
    func: ProcessFn,
    accepts: InputShape,
    produces: Arity,
}

impl Callable {
    /// Wrap a closure. Give anonymous closures a meaningful name; it is what
    /// lookups and error messages show.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: FnMut(&Value) -> BlockResult<Value> + Send + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
            accepts: InputShape::Single,
            produces: Arity::Single,
        }
    }

    /// Lift a numeric function element-wise over scalars, vectors and signals.
    pub fn map<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + 'static,
    {
        Self::new(name, move |input: &Value| {
            input.map_numeric(&f).ok_or(BlockError::UnexpectedValue {
                expected: "a scalar, vector or signal",
                found: input.kind(),
            })
        })
    }

    /// Declare the input shape this closure handles (default: a single value).
    pub fn accepting(mut self, shape: InputShape) -> Self {
        self.accepts = shape;
        self
    }

    /// Declare what this closure returns (default: a single value). A pass
    /// fails if the closure returns anything else.
    pub fn producing(mut self, arity: Arity) -> Self {
        self.produces = arity;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn accepts(&self) -> InputShape {
        self.accepts
    }

    pub fn produces(&self) -> Arity {
        self.produces
    }

    pub fn process(&mut self, input: &Value) -> BlockResult<Value> {
        (self.func)(input)
    }
}

impl std::fmt::Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("accepts", &self.accepts)
            .field("produces", &self.produces)
            .finish()
    }
}
