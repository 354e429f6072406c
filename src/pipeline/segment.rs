//! Fixed-length segmenting of recordings, for feeding stored data through a
//! graph one chunk per pass.
//!
//! Only full-length segments are produced. When the samples do not divide
//! evenly the tail is dropped and a warning is logged.

use crate::error::{DaqflowError, Result};
use crate::pipeline::value::Signal;
use std::ops::Range;

/// Sample ranges of consecutive segments of `length` samples, each sharing
/// `overlap` samples with the previous one.
///
/// ```
/// use daqflow::pipeline::segment_indices;
///
/// let ranges: Vec<_> = segment_indices(11, 5, 2).unwrap().collect();
/// assert_eq!(ranges, vec![0..5, 3..8, 6..11]);
/// ```
pub fn segment_indices(
    n: usize,
    length: usize,
    overlap: usize,
) -> Result<impl Iterator<Item = Range<usize>>> {
    if length == 0 {
        return Err(DaqflowError::InvalidArgument(
            "segment length must be positive".to_string(),
        ));
    }
    if overlap >= length {
        return Err(DaqflowError::InvalidArgument(format!(
            "overlap {} must be smaller than segment length {}",
            overlap, length
        )));
    }

    let skip = length - overlap;
    if n < length || (n - length) % skip != 0 {
        tracing::warn!(
            "Data (length {}) cannot be chunked evenly into segments of length {} with overlap {}",
            n,
            length,
            overlap
        );
    }

    Ok((0..n)
        .step_by(skip)
        .take_while(move |&start| start + length <= n)
        .map(move |start| start..start + length))
}

/// Split `data` into segments of `length` samples per channel.
pub fn segment(data: &Signal, length: usize, overlap: usize) -> Result<Vec<Signal>> {
    Ok(segment_indices(data.samples(), length, overlap)?
        .map(|range| data.slice_samples(range.start, range.end))
        .collect())
}
