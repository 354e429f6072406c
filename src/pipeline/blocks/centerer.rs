//! Centerer: removes the mean.
//!
//! Signals are centered channel by channel; vectors and scalars around
//! their own mean.

use crate::pipeline::error::{BlockError, BlockResult};
use crate::pipeline::value::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct Centerer;

impl Centerer {
    pub fn new() -> Self {
        Self
    }

    pub fn name(&self) -> &str {
        "Centerer"
    }

    pub fn process(&mut self, input: &Value) -> BlockResult<Value> {
        match input {
            Value::Scalar(_) => Ok(Value::Scalar(0.0)),
            Value::Vector(v) => {
                let mut out = v.clone();
                center(&mut out);
                Ok(Value::Vector(out))
            }
            Value::Signal(s) => {
                let mut out = s.clone();
                for c in 0..out.channels() {
                    center(out.row_mut(c));
                }
                Ok(Value::Signal(out))
            }
            Value::Tuple(_) => Err(BlockError::UnexpectedValue {
                expected: "a scalar, vector or signal",
                found: input.kind(),
            }),
        }
    }
}

fn center(values: &mut [f64]) {
    if values.is_empty() {
        return;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter_mut().for_each(|x| *x -= mean);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::value::Signal;

    #[test]
    fn test_centers_each_channel() {
        let s = Signal::from_rows(&[[1.0, 3.0], [10.0, 20.0]]).unwrap();
        let out = Centerer.process(&Value::Signal(s)).unwrap();
        assert_eq!(
            out,
            Value::Signal(Signal::from_rows(&[[-1.0, 1.0], [-5.0, 5.0]]).unwrap())
        );
    }

    #[test]
    fn test_centers_vector() {
        let out = Centerer.process(&Value::Vector(vec![2.0, 4.0, 6.0])).unwrap();
        assert_eq!(out, Value::Vector(vec![-2.0, 0.0, 2.0]));
        assert_eq!(
            Centerer.process(&Value::Vector(vec![])).unwrap(),
            Value::Vector(vec![])
        );
    }

    #[test]
    fn test_rejects_tuple() {
        assert!(Centerer.process(&Value::tuple([1.0, 2.0])).is_err());
    }
}
