//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use daqflow::pipeline::{Signal, Value};

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Assert two slices are element-wise approximately equal
pub fn assert_slice_eq(a: &[f64], b: &[f64], epsilon: f64) {
    assert_eq!(a.len(), b.len(), "length mismatch: {:?} vs {:?}", a, b);
    for (x, y) in a.iter().zip(b) {
        assert_float_eq(*x, *y, epsilon);
    }
}

/// `channels x samples` signal whose row `c` counts up from `c * 100`
pub fn ramp_signal(channels: usize, samples: usize) -> Signal {
    let rows: Vec<Vec<f64>> = (0..channels)
        .map(|c| (0..samples).map(|s| (c * 100 + s) as f64).collect())
        .collect();
    Signal::from_rows(&rows).unwrap()
}

/// Unwrap a signal output
pub fn expect_signal(value: Value) -> Signal {
    match value {
        Value::Signal(signal) => signal,
        other => panic!("expected a signal, got {:?}", other),
    }
}
