//! Test blocks and hooks with recorded side effects

use daqflow::pipeline::blocks::Callable;
use daqflow::pipeline::{observer, Block, BlockError, BlockResult, Hook, Value};
use std::sync::{Arc, Mutex};

/// Shared, ordered log of block runs and hook calls
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hook recording `tag=<output json>`
    pub fn hook(&self, tag: &str) -> impl Hook + 'static {
        let log = Arc::clone(&self.0);
        let tag = tag.to_string();
        observer(move |v: &Value| {
            let json = serde_json::to_string(v).unwrap();
            log.lock().unwrap().push(format!("{}={}", tag, json));
        })
    }

    /// Element-wise block that records `run:<name>` each time it runs
    pub fn block<F>(&self, name: &str, f: F) -> Callable
    where
        F: Fn(f64) -> f64 + Send + 'static,
    {
        let log = Arc::clone(&self.0);
        let tag = format!("run:{}", name);
        let mut inner = Callable::map(name, f);
        Callable::new(name, move |v: &Value| {
            log.lock().unwrap().push(tag.clone());
            inner.process(v)
        })
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// Error raised by `FaultyBlock`
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("sensor {channel} saturated")]
pub struct SensorFault {
    pub channel: usize,
}

/// User block that fails on every pass where the input exceeds `limit`
pub struct FaultyBlock {
    pub limit: f64,
}

impl Block for FaultyBlock {
    fn name(&self) -> &str {
        "faulty"
    }

    fn process(&mut self, input: &Value) -> BlockResult<Value> {
        match input.as_scalar() {
            Some(x) if x > self.limit => Err(BlockError::custom(SensorFault { channel: 3 })),
            Some(_) => Ok(input.clone()),
            None => Err(BlockError::UnexpectedValue {
                expected: "a scalar",
                found: input.kind(),
            }),
        }
    }
}

/// Block summing a tuple of scalars
pub fn tuple_sum(name: &str, arity: usize) -> Callable {
    Callable::new(name, |v: &Value| {
        let items = v.as_tuple().ok_or(BlockError::UnexpectedValue {
            expected: "a tuple",
            found: v.kind(),
        })?;
        Ok(Value::Scalar(items.iter().filter_map(Value::as_scalar).sum()))
    })
    .accepting(daqflow::pipeline::InputShape::Tuple(arity))
}
