//! Values flowing along pipeline edges.
//!
//! A `Value` is either a single datum (scalar, 1-D vector, 2-D signal) or an
//! ordered tuple produced by a fan-out. The engine never inspects values
//! beyond their arity; blocks interpret them.

use crate::pipeline::port::Arity;
use serde::{Deserialize, Serialize};

/// Row-major 2-D array of shape `(channels, samples)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<Vec<f64>>", try_from = "Vec<Vec<f64>>")]
pub struct Signal {
    channels: usize,
    samples: usize,
    data: Vec<f64>,
}

impl Signal {
    /// All-zero signal.
    pub fn zeros(channels: usize, samples: usize) -> Self {
        Self {
            channels,
            samples,
            data: vec![0.0; channels * samples],
        }
    }

    /// Build from a flat row-major buffer. Returns `None` if the length
    /// does not match the shape.
    pub fn from_flat(channels: usize, samples: usize, data: Vec<f64>) -> Option<Self> {
        if data.len() != channels * samples {
            return None;
        }
        Some(Self {
            channels,
            samples,
            data,
        })
    }

    /// Build from rows. Returns `None` for ragged input.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Option<Self> {
        let channels = rows.len();
        let samples = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut data = Vec::with_capacity(channels * samples);
        for row in rows {
            let row = row.as_ref();
            if row.len() != samples {
                return None;
            }
            data.extend_from_slice(row);
        }
        Some(Self {
            channels,
            samples,
            data,
        })
    }

    /// Single-channel signal.
    pub fn row_vector(samples: Vec<f64>) -> Self {
        Self {
            channels: 1,
            samples: samples.len(),
            data: samples,
        }
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    pub fn samples(&self) -> usize {
        self.samples
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.channels, self.samples)
    }

    #[inline]
    pub fn get(&self, channel: usize, sample: usize) -> Option<f64> {
        if channel < self.channels && sample < self.samples {
            Some(self.data[channel * self.samples + sample])
        } else {
            None
        }
    }

    #[inline]
    pub fn row(&self, channel: usize) -> &[f64] {
        let start = channel * self.samples;
        &self.data[start..start + self.samples]
    }

    #[inline]
    pub fn row_mut(&mut self, channel: usize) -> &mut [f64] {
        let start = channel * self.samples;
        &mut self.data[start..start + self.samples]
    }

    /// Iterate over channels.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact panics on a zero chunk size
        let width = self.samples.max(1);
        self.data
            .chunks_exact(width)
            .take(if self.samples == 0 { 0 } else { self.channels })
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Swap channels and samples.
    pub fn transpose(&self) -> Self {
        let mut out = Self::zeros(self.samples, self.channels);
        for c in 0..self.channels {
            for s in 0..self.samples {
                out.data[s * self.channels + c] = self.data[c * self.samples + s];
            }
        }
        out
    }

    /// Columns `from..to` of every channel.
    pub fn slice_samples(&self, from: usize, to: usize) -> Self {
        let to = to.min(self.samples);
        let from = from.min(to);
        let width = to - from;
        let mut data = Vec::with_capacity(self.channels * width);
        for c in 0..self.channels {
            data.extend_from_slice(&self.row(c)[from..to]);
        }
        Self {
            channels: self.channels,
            samples: width,
            data,
        }
    }
}

// A signal with no samples still writes one empty row per channel. Only a
// zero-channel signal serializes as `[]`, which reads back as an empty vector.
impl From<Signal> for Vec<Vec<f64>> {
    fn from(signal: Signal) -> Self {
        (0..signal.channels).map(|c| signal.row(c).to_vec()).collect()
    }
}

impl TryFrom<Vec<Vec<f64>>> for Signal {
    type Error = String;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Signal::from_rows(&rows).ok_or_else(|| "signal rows must all have the same length".to_string())
    }
}

/// A datum passed between blocks.
///
/// Serializes untagged: scalars as numbers, vectors as flat lists, signals
/// as lists of rows, tuples as mixed lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(f64),
    Vector(Vec<f64>),
    Signal(Signal),
    Tuple(Vec<Value>),
}

impl Value {
    /// Build a tuple value.
    pub fn tuple<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Value::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Number of values this datum presents to a downstream consumer.
    pub fn arity(&self) -> Arity {
        match self {
            Value::Tuple(items) => Arity::Tuple(items.len()),
            _ => Arity::Single,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Vector(_) => "vector",
            Value::Signal(_) => "signal",
            Value::Tuple(_) => "tuple",
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_signal(&self) -> Option<&Signal> {
        match self {
            Value::Signal(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn into_tuple(self) -> Option<Vec<Value>> {
        match self {
            Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Apply `f` to every number in a scalar, vector or signal.
    /// Returns `None` for tuples.
    pub fn map_numeric(&self, f: impl Fn(f64) -> f64) -> Option<Value> {
        match self {
            Value::Scalar(x) => Some(Value::Scalar(f(*x))),
            Value::Vector(v) => Some(Value::Vector(v.iter().map(|&x| f(x)).collect())),
            Value::Signal(s) => {
                let mut out = s.clone();
                out.as_mut_slice().iter_mut().for_each(|x| *x = f(*x));
                Some(Value::Signal(out))
            }
            Value::Tuple(_) => None,
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Scalar(x)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Vector(v)
    }
}

impl From<Signal> for Value {
    fn from(s: Signal) -> Self {
        Value::Signal(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Tuple(items)
    }
}
