//! Rhai script engine implementation.
//!
//! ## Scope
//!
//! - `x` - the block input, converted to a Rhai value
//!
//! ## Helper Functions
//!
//! - `sum(array)`, `mean(array)`, `rms(array)` - reductions over numbers
//! - `clamp(x, lo, hi)`, `min(a, b)`, `max(a, b)`
//! - `abs`, `sqrt`, `pow`, `exp`, `ln`, `log10`, `sign`, `lerp`, `map_range`

use crate::config::ScriptSettings;
use crate::error::{DaqflowError, Result};
use crate::pipeline::value::{Signal, Value};
use crate::scripting::{CompiledScript, ScriptCache, SharedScriptCache};
use rhai::{Array, Dynamic, Engine, Scope};
use std::sync::{Arc, RwLock};

/// Name the block input is bound to inside scripts.
pub const INPUT_VAR: &str = "x";

/// Shared, cheaply clonable script engine.
#[derive(Clone)]
pub struct ScriptEngine {
    engine: Arc<Engine>,
    cache: SharedScriptCache,
}

impl ScriptEngine {
    /// Engine with default safety limits.
    pub fn new() -> Self {
        Self::with_settings(&ScriptSettings::default())
    }

    /// Engine with the limits from `settings`.
    pub fn with_settings(settings: &ScriptSettings) -> Self {
        let mut engine = Engine::new();
        Self::configure_engine(&mut engine, settings);
        Self {
            engine: Arc::new(engine),
            cache: Arc::new(RwLock::new(ScriptCache::new())),
        }
    }

    fn configure_engine(engine: &mut Engine, settings: &ScriptSettings) {
        engine.set_max_expr_depths(64, 64);
        engine.set_max_call_levels(settings.max_call_levels);
        engine.set_max_operations(settings.max_operations);
        engine.set_max_string_size(10_000);
        engine.set_max_array_size(settings.max_array_size);
        engine.set_max_map_size(1_000);

        // ===== Reductions =====

        engine.register_fn("sum", |a: Array| -> f64 { numbers(&a).sum() });
        engine.register_fn("mean", |a: Array| -> f64 {
            if a.is_empty() {
                f64::NAN
            } else {
                numbers(&a).sum::<f64>() / a.len() as f64
            }
        });
        engine.register_fn("rms", |a: Array| -> f64 {
            if a.is_empty() {
                f64::NAN
            } else {
                (numbers(&a).map(|x| x * x).sum::<f64>() / a.len() as f64).sqrt()
            }
        });

        // ===== Mathematical Functions =====

        engine.register_fn("abs", |x: f64| x.abs());
        engine.register_fn("sqrt", |x: f64| x.sqrt());
        engine.register_fn("pow", |x: f64, y: f64| x.powf(y));
        engine.register_fn("exp", |x: f64| x.exp());
        engine.register_fn("ln", |x: f64| x.ln());
        engine.register_fn("log10", |x: f64| x.log10());
        engine.register_fn("clamp", |x: f64, min: f64, max: f64| x.clamp(min, max));
        engine.register_fn("min", |a: f64, b: f64| a.min(b));
        engine.register_fn("max", |a: f64, b: f64| a.max(b));
        engine.register_fn("sign", |x: f64| {
            if x > 0.0 {
                1.0
            } else if x < 0.0 {
                -1.0
            } else {
                0.0
            }
        });
        engine.register_fn("lerp", |a: f64, b: f64, t: f64| a + (b - a) * t);
        engine.register_fn(
            "map_range",
            |x: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64| {
                (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
            },
        );
    }

    /// Compile a script and cache it.
    pub fn compile(&self, name: &str, source: &str) -> Result<CompiledScript> {
        let mut cache = self
            .cache
            .write()
            .map_err(|e| DaqflowError::Script(format!("Failed to acquire cache lock: {}", e)))?;

        cache.get_or_compile(&self.engine, name, source)
    }

    /// Evaluate a compiled script with `x` bound to `input`.
    pub fn execute(&self, script: &CompiledScript, input: &Value) -> Result<Dynamic> {
        let mut scope = Scope::new();
        scope.push(INPUT_VAR, to_dynamic(input));

        self.engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, script.ast())
            .map_err(|e| DaqflowError::from_rhai_error(e).with_context(script.name().to_string()))
    }

    /// Evaluate and convert the result back into a `Value`.
    pub fn execute_value(&self, script: &CompiledScript, input: &Value) -> Result<Value> {
        let result = self.execute(script, input)?;
        from_dynamic(result)
    }

    /// Compile and evaluate in one step.
    pub fn eval(&self, source: &str, input: &Value) -> Result<Value> {
        let script = self.compile("eval", source)?;
        self.execute_value(&script, input)
    }

    pub fn cached_scripts(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScriptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptEngine")
            .field("cache_size", &self.cached_scripts())
            .finish()
    }
}

fn as_number(d: &Dynamic) -> Option<f64> {
    d.as_float()
        .ok()
        .or_else(|| d.as_int().ok().map(|i| i as f64))
}

fn numbers(a: &Array) -> impl Iterator<Item = f64> + '_ {
    a.iter().map(|d| as_number(d).unwrap_or(f64::NAN))
}

/// Convert a pipeline value into a Rhai value.
///
/// Scalars become floats, vectors arrays of floats, signals arrays of rows
/// and tuples arrays of their converted elements.
pub fn to_dynamic(value: &Value) -> Dynamic {
    match value {
        Value::Scalar(x) => Dynamic::from_float(*x),
        Value::Vector(v) => floats(v),
        Value::Signal(s) => {
            let rows: Array = s.rows().map(floats).collect();
            Dynamic::from_array(rows)
        }
        Value::Tuple(items) => {
            let items: Array = items.iter().map(to_dynamic).collect();
            Dynamic::from_array(items)
        }
    }
}

fn floats(v: &[f64]) -> Dynamic {
    Dynamic::from_array(v.iter().map(|&x| Dynamic::from_float(x)).collect())
}

/// Convert a script result back into a pipeline value.
///
/// Numbers become scalars, arrays of numbers vectors, rectangular arrays of
/// number arrays signals; any other array becomes a tuple.
pub fn from_dynamic(value: Dynamic) -> Result<Value> {
    if let Some(x) = as_number(&value) {
        return Ok(Value::Scalar(x));
    }
    if value.is_array() {
        let items = value
            .into_array()
            .map_err(|t| DaqflowError::Script(format!("expected an array, got {}", t)))?;
        return array_to_value(items);
    }
    Err(DaqflowError::Script(format!(
        "script must return a number or an array, got {}",
        value.type_name()
    )))
}

/// Convert a script array into a tuple, element by element.
pub fn from_dynamic_tuple(value: Dynamic) -> Result<Value> {
    if !value.is_array() {
        return from_dynamic(value);
    }
    let items = value
        .into_array()
        .map_err(|t| DaqflowError::Script(format!("expected an array, got {}", t)))?;
    let items = items.into_iter().map(from_dynamic).collect::<Result<Vec<_>>>()?;
    Ok(Value::Tuple(items))
}

fn array_to_value(items: Array) -> Result<Value> {
    if let Some(v) = items.iter().map(as_number).collect::<Option<Vec<f64>>>() {
        return Ok(Value::Vector(v));
    }

    let rows: Option<Vec<Vec<f64>>> = items
        .iter()
        .map(|row| {
            row.read_lock::<Array>()
                .and_then(|r| r.iter().map(as_number).collect::<Option<Vec<f64>>>())
        })
        .collect();
    if let Some(signal) = rows.as_deref().and_then(Signal::from_rows) {
        return Ok(Value::Signal(signal));
    }

    let items = items.into_iter().map(from_dynamic).collect::<Result<Vec<_>>>()?;
    Ok(Value::Tuple(items))
}
