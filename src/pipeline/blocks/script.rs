//! Script: a block evaluating a Rhai expression.
//!
//! The script is compiled once at construction; `x` is bound to the input
//! on every pass. When the block declares a tuple output, a returned array
//! is split into tuple elements.

use crate::error::Result;
use crate::pipeline::error::{BlockError, BlockResult};
use crate::pipeline::port::{Arity, InputShape};
use crate::pipeline::value::Value;
use crate::scripting::{from_dynamic, from_dynamic_tuple, CompiledScript, ScriptEngine};

#[derive(Debug, Clone)]
pub struct Script {
    name: String,
    engine: ScriptEngine,
    script: CompiledScript,
    accepts: InputShape,
    produces: Arity,
}

impl Script {
    /// Compile `source` with `engine`. Syntax errors surface here, not at
    /// the first pass.
    pub fn new(engine: &ScriptEngine, name: impl Into<String>, source: &str) -> Result<Self> {
        let name = name.into();
        let script = engine.compile(&name, source)?;
        Ok(Self {
            name,
            engine: engine.clone(),
            script,
            accepts: InputShape::Single,
            produces: Arity::Single,
        })
    }

    pub fn accepting(mut self, shape: InputShape) -> Self {
        self.accepts = shape;
        self
    }

    pub fn producing(mut self, arity: Arity) -> Self {
        self.produces = arity;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        self.script.source()
    }

    pub fn accepts(&self) -> InputShape {
        self.accepts
    }

    pub fn produces(&self) -> Arity {
        self.produces
    }

    pub fn process(&mut self, input: &Value) -> BlockResult<Value> {
        let result = self
            .engine
            .execute(&self.script, input)
            .map_err(|e| BlockError::Script(e.to_string()))?;

        let value = match self.produces {
            Arity::Single => from_dynamic(result),
            Arity::Tuple(_) => from_dynamic_tuple(result),
        }
        .map_err(|e| BlockError::Script(e.to_string()))?;

        if let Arity::Tuple(n) = self.produces {
            let found = value.as_tuple().map(<[Value]>::len).unwrap_or(1);
            if found != n {
                return Err(BlockError::TupleLength { expected: n, found });
            }
        }
        Ok(value)
    }
}
