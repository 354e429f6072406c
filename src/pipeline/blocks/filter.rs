//! Filter: time-domain IIR/FIR filtering of 2-D signal input.
//!
//! Coefficients are designed elsewhere; this block only applies them,
//! carrying each channel's delay line across passes so that consecutive
//! inputs are filtered as one continuous stream.
//!
//! When inputs overlap (for example the output of a `Windower` whose new
//! data is shorter than the window), `overlap` is the number of samples each
//! input repeats from the end of the previous one. The carried state is then
//! taken from just before those repeated samples, so consecutive outputs
//! agree on the overlapping region.

use crate::pipeline::blocks::expect_signal;
use crate::pipeline::error::{BlockError, BlockResult};
use crate::pipeline::value::{Signal, Value};

#[derive(Debug, Clone)]
pub struct Filter {
    /// Numerator, normalized by `a[0]` and padded to `order + 1`.
    b: Vec<f64>,
    /// Denominator, normalized by `a[0]` and padded to `order + 1`.
    a: Vec<f64>,
    overlap: usize,
    /// Per-channel delay line of length `order`, `None` until the first pass.
    state: Option<Vec<Vec<f64>>>,
}

impl Filter {
    /// Filter with numerator `b`, denominator `a` (`[1.0]` for FIR) and the
    /// number of samples consecutive inputs share.
    pub fn new(b: Vec<f64>, a: Vec<f64>, overlap: usize) -> BlockResult<Self> {
        if b.is_empty() {
            return Err(BlockError::InvalidParameter(
                "numerator coefficients must not be empty".to_string(),
            ));
        }
        let a0 = match a.first() {
            Some(&a0) if a0 != 0.0 && a0.is_finite() => a0,
            Some(_) => {
                return Err(BlockError::InvalidParameter(
                    "first denominator coefficient must be finite and non-zero".to_string(),
                ))
            }
            None => 1.0,
        };

        let taps = b.len().max(a.len()).max(1);
        let mut nb = vec![0.0; taps];
        let mut na = vec![0.0; taps];
        for (dst, src) in nb.iter_mut().zip(&b) {
            *dst = src / a0;
        }
        for (dst, src) in na.iter_mut().zip(&a) {
            *dst = src / a0;
        }
        na[0] = 1.0;

        Ok(Self {
            b: nb,
            a: na,
            overlap,
            state: None,
        })
    }

    /// FIR filter with no overlap.
    pub fn fir(b: Vec<f64>) -> BlockResult<Self> {
        Self::new(b, vec![1.0], 0)
    }

    pub fn name(&self) -> &str {
        "Filter"
    }

    /// Filter order (length of each channel's delay line).
    pub fn order(&self) -> usize {
        self.b.len() - 1
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn process(&mut self, input: &Value) -> BlockResult<Value> {
        let signal = expect_signal(input)?;
        let (channels, n) = signal.shape();
        let order = self.order();

        if self.overlap > 0 && n <= self.overlap {
            return Err(BlockError::InvalidInput(format!(
                "input has {} samples but overlap is {}",
                n, self.overlap
            )));
        }

        let state = self
            .state
            .get_or_insert_with(|| vec![vec![0.0; order]; channels]);
        if state.len() != channels {
            return Err(BlockError::InvalidInput(format!(
                "channel count changed from {} to {} without clear",
                state.len(),
                channels
            )));
        }

        // The state carried into the next pass is the one in effect just
        // before the first repeated sample.
        let carry_after = (self.overlap > 0).then(|| n - self.overlap - 1);
        let mut out = Signal::zeros(channels, n);

        for (c, z) in state.iter_mut().enumerate() {
            let x = signal.row(c);
            let y = out.row_mut(c);
            let mut carried: Option<Vec<f64>> = None;
            for i in 0..n {
                y[i] = step(&self.b, &self.a, z, x[i]);
                if Some(i) == carry_after {
                    carried = Some(z.clone());
                }
            }
            if let Some(carried) = carried {
                *z = carried;
            }
        }

        Ok(Value::Signal(out))
    }

    /// Forget the initial conditions. Call this when a new recording starts.
    pub fn clear(&mut self) {
        self.state = None;
    }
}

/// One sample through a direct form II transposed section.
#[inline]
fn step(b: &[f64], a: &[f64], z: &mut [f64], x: f64) -> f64 {
    let order = z.len();
    if order == 0 {
        return b[0] * x;
    }
    let y = b[0] * x + z[0];
    for j in 0..order - 1 {
        z[j] = b[j + 1] * x + z[j + 1] - a[j + 1] * y;
    }
    z[order - 1] = b[order] * x - a[order] * y;
    y
}
