//! Rhai scripting for configuration-driven blocks.
//!
//! A script is a Rhai expression evaluated once per pass with the block
//! input bound to `x`. Values cross the boundary as plain numbers and
//! (nested) arrays; see [`to_dynamic`] and [`from_dynamic`].
//!
//! ## Example Scripts
//!
//! Rectify and scale:
//! ```rhai
//! abs(x) * 1000.0
//! ```
//!
//! Root-mean-square of every channel of a signal:
//! ```rhai
//! let out = [];
//! for row in x { out.push(rms(row)); }
//! out
//! ```
//!
//! Fan a scalar out into a 2-tuple (declare `produces = 2`):
//! ```rhai
//! [x, x * x]
//! ```

mod engine;

pub use engine::{from_dynamic, from_dynamic_tuple, to_dynamic, ScriptEngine, INPUT_VAR};

use crate::error::{DaqflowError, Result};
use rhai::{Engine, AST};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A compiled script that can be executed repeatedly.
#[derive(Clone)]
pub struct CompiledScript {
    ast: Arc<AST>,
    source: String,
    name: String,
}

impl CompiledScript {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn ast(&self) -> &AST {
        &self.ast
    }
}

impl std::fmt::Debug for CompiledScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledScript")
            .field("name", &self.name)
            .field("source", &self.source)
            .finish()
    }
}

/// Compiled scripts keyed by source text.
#[derive(Default)]
pub struct ScriptCache {
    cache: HashMap<String, CompiledScript>,
}

impl ScriptCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached script or compile and cache it.
    pub fn get_or_compile(&mut self, engine: &Engine, name: &str, source: &str) -> Result<CompiledScript> {
        if let Some(script) = self.cache.get(source) {
            return Ok(CompiledScript {
                name: name.to_string(),
                ..script.clone()
            });
        }

        let ast = engine
            .compile(source)
            .map_err(|e| DaqflowError::Script(format!("Compilation error in `{}`: {}", name, e)))?;

        let script = CompiledScript {
            ast: Arc::new(ast),
            source: source.to_string(),
            name: name.to_string(),
        };

        self.cache.insert(source.to_string(), script.clone());
        Ok(script)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Thread-safe script cache wrapper.
pub(crate) type SharedScriptCache = Arc<RwLock<ScriptCache>>;
