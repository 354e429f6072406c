//! Windower: sliding window over 2-D signal input.
//!
//! New samples are appended at the end of the window and the oldest ones
//! fall off the front. The first pass after construction or `clear` is
//! zero-padded. The input length may change from pass to pass, but the
//! channel count is fixed until `clear`.

use crate::pipeline::blocks::expect_signal;
use crate::pipeline::error::{BlockError, BlockResult};
use crate::pipeline::value::{Signal, Value};

#[derive(Debug, Clone)]
pub struct Windower {
    length: usize,
    buffer: Option<Signal>,
}

impl Windower {
    /// Window holding `length` samples per channel.
    pub fn new(length: usize) -> Self {
        Self {
            length,
            buffer: None,
        }
    }

    pub fn name(&self) -> &str {
        "Windower"
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn process(&mut self, input: &Value) -> BlockResult<Value> {
        let signal = expect_signal(input)?;
        let (channels, n) = signal.shape();
        let length = self.length;

        if n > length {
            return Err(BlockError::InvalidInput(format!(
                "input has {} samples but the window holds {}",
                n, length
            )));
        }

        let buffer = self
            .buffer
            .get_or_insert_with(|| Signal::zeros(channels, length));

        if buffer.channels() != channels {
            return Err(BlockError::InvalidInput(format!(
                "channel count changed from {} to {} without clear",
                buffer.channels(),
                channels
            )));
        }

        if n == length {
            *buffer = signal.clone();
        } else {
            for c in 0..channels {
                let row = buffer.row_mut(c);
                row.copy_within(n.., 0);
                row[length - n..].copy_from_slice(signal.row(c));
            }
        }

        Ok(Value::Signal(buffer.clone()))
    }

    /// Drop the buffered history.
    pub fn clear(&mut self) {
        self.buffer = None;
    }
}
