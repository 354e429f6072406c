//! FeatureExtractor: concatenates several features into one vector.
//!
//! Each feature sees the same signal and returns a flat list of values. The
//! first pass after construction or `clear` records where each feature's
//! values sit in the output (`feature_indices`); later passes must produce
//! the same lengths.

use crate::pipeline::blocks::expect_signal;
use crate::pipeline::error::{BlockError, BlockResult};
use crate::pipeline::value::{Signal, Value};
use std::ops::Range;

/// A statistic computed from a `channels x samples` signal.
pub trait Feature: Send {
    fn compute(&mut self, signal: &Signal) -> BlockResult<Vec<f64>>;
}

impl<F> Feature for F
where
    F: FnMut(&Signal) -> BlockResult<Vec<f64>> + Send,
{
    fn compute(&mut self, signal: &Signal) -> BlockResult<Vec<f64>> {
        self(signal)
    }
}

struct NamedFeature {
    name: String,
    feature: Box<dyn Feature>,
}

#[derive(Default)]
pub struct FeatureExtractor {
    features: Vec<NamedFeature>,
    /// Output range per feature, in declaration order. Empty until the
    /// first pass.
    indices: Vec<Range<usize>>,
    output: Vec<f64>,
}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named feature.
    pub fn with_feature(mut self, name: impl Into<String>, feature: impl Feature + 'static) -> Self {
        self.features.push(NamedFeature {
            name: name.into(),
            feature: Box::new(feature),
        });
        self.clear();
        self
    }

    pub fn name(&self) -> &str {
        "FeatureExtractor"
    }

    /// Feature names in declaration order.
    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.name.as_str())
    }

    /// `(name, range)` for every feature. Empty until data has passed through.
    pub fn feature_indices(&self) -> impl Iterator<Item = (&str, Range<usize>)> {
        self.features
            .iter()
            .zip(&self.indices)
            .map(|(f, r)| (f.name.as_str(), r.clone()))
    }

    /// Output range of one feature.
    pub fn feature_range(&self, name: &str) -> Option<Range<usize>> {
        self.feature_indices()
            .find(|(n, _)| *n == name)
            .map(|(_, r)| r)
    }

    pub fn process(&mut self, input: &Value) -> BlockResult<Value> {
        let signal = expect_signal(input)?;

        if self.indices.is_empty() {
            let mut output = Vec::new();
            let mut indices = Vec::with_capacity(self.features.len());
            for named in &mut self.features {
                let values = named.feature.compute(signal)?;
                let start = output.len();
                output.extend_from_slice(&values);
                indices.push(start..output.len());
            }
            self.output = output;
            self.indices = indices;
        } else {
            for (named, range) in self.features.iter_mut().zip(&self.indices) {
                let values = named.feature.compute(signal)?;
                if values.len() != range.len() {
                    return Err(BlockError::InvalidInput(format!(
                        "feature `{}` produced {} values but {} were recorded; clear after changing the input shape",
                        named.name,
                        values.len(),
                        range.len()
                    )));
                }
                self.output[range.clone()].copy_from_slice(&values);
            }
        }

        Ok(Value::Vector(self.output.clone()))
    }

    /// Forget the recorded layout.
    pub fn clear(&mut self) {
        self.indices.clear();
        self.output.clear();
    }
}

impl std::fmt::Debug for FeatureExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureExtractor")
            .field("features", &self.feature_names().collect::<Vec<_>>())
            .field("indices", &self.indices)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mean_abs(s: &Signal) -> BlockResult<Vec<f64>> {
        Ok(s
            .rows()
            .map(|r| r.iter().map(|x| x.abs()).sum::<f64>() / r.len() as f64)
            .collect())
    }

    fn peak(s: &Signal) -> BlockResult<Vec<f64>> {
        Ok(vec![s.as_slice().iter().cloned().fold(f64::MIN, f64::max)])
    }

    fn extractor() -> FeatureExtractor {
        FeatureExtractor::new()
            .with_feature("mav", mean_abs)
            .with_feature("peak", peak)
    }

    #[test]
    fn test_concatenates_and_records_indices() {
        let mut fe = extractor();
        assert_eq!(fe.feature_indices().count(), 0);

        let s = Signal::from_rows(&[[1.0, -3.0], [2.0, 2.0]]).unwrap();
        let out = fe.process(&Value::Signal(s)).unwrap();
        assert_eq!(out, Value::Vector(vec![2.0, 2.0, 2.0]));
        assert_eq!(fe.feature_range("mav"), Some(0..2));
        assert_eq!(fe.feature_range("peak"), Some(2..3));
    }

    #[test]
    fn test_shape_change_requires_clear() {
        let mut fe = extractor();
        let two = Signal::from_rows(&[[1.0], [2.0]]).unwrap();
        let three = Signal::from_rows(&[[1.0], [2.0], [3.0]]).unwrap();

        fe.process(&Value::Signal(two)).unwrap();
        assert!(matches!(
            fe.process(&Value::Signal(three.clone())),
            Err(BlockError::InvalidInput(_))
        ));

        fe.clear();
        let out = fe.process(&Value::Signal(three)).unwrap();
        assert_eq!(out.as_vector().unwrap().len(), 4);
        assert_eq!(fe.feature_range("peak"), Some(3..4));
    }

    #[test]
    fn test_feature_error_propagates() {
        let mut fe = FeatureExtractor::new().with_feature("broken", |_: &Signal| -> BlockResult<Vec<f64>> {
            Err(BlockError::InvalidInput("no samples".to_string()))
        });
        let s = Signal::zeros(1, 1);
        assert!(fe.process(&Value::Signal(s)).is_err());
    }
}
