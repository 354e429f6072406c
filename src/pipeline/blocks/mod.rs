//! Built-in block implementations.
//!
//! Each block is a plain struct with inherent `name`/`process`/`clear`
//! methods; `BuiltinBlock` dispatches to them without dynamic dispatch.

pub mod callable;
pub mod centerer;
pub mod ensure_2d;
pub mod feature_extractor;
pub mod filter;
pub mod script;
pub mod windower;

pub use callable::Callable;
pub use centerer::Centerer;
pub use ensure_2d::{Ensure2D, Orientation};
pub use feature_extractor::{Feature, FeatureExtractor};
pub use filter::Filter;
pub use script::Script;
pub use windower::Windower;

use crate::pipeline::error::BlockError;
use crate::pipeline::value::{Signal, Value};

/// Borrow a 2-D signal out of `input` or report what was found instead.
pub(crate) fn expect_signal(input: &Value) -> Result<&Signal, BlockError> {
    input.as_signal().ok_or(BlockError::UnexpectedValue {
        expected: "a 2-D signal",
        found: input.kind(),
    })
}
