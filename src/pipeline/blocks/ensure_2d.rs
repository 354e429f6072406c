//! Ensure2D: promotes scalars and vectors to 2-D signals.

use crate::pipeline::error::{BlockError, BlockResult};
use crate::pipeline::value::{Signal, Value};
use serde::Deserialize;

/// Shape of the promoted output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// `1 x n`: one channel of `n` samples.
    #[default]
    Row,
    /// `n x 1`: `n` channels of one sample.
    Col,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Ensure2D {
    orientation: Orientation,
}

impl Ensure2D {
    pub fn new(orientation: Orientation) -> Self {
        Self { orientation }
    }

    pub fn row() -> Self {
        Self::new(Orientation::Row)
    }

    pub fn col() -> Self {
        Self::new(Orientation::Col)
    }

    pub fn name(&self) -> &str {
        "Ensure2D"
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// 2-D input is left alone in row orientation and transposed in column
    /// orientation.
    pub fn process(&mut self, input: &Value) -> BlockResult<Value> {
        let row = match input {
            Value::Scalar(x) => Signal::row_vector(vec![*x]),
            Value::Vector(v) => Signal::row_vector(v.clone()),
            Value::Signal(s) => s.clone(),
            Value::Tuple(_) => {
                return Err(BlockError::UnexpectedValue {
                    expected: "a scalar, vector or signal",
                    found: input.kind(),
                })
            }
        };
        let out = match self.orientation {
            Orientation::Row => row,
            Orientation::Col => row.transpose(),
        };
        Ok(Value::Signal(out))
    }
}
