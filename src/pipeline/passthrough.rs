//! Passthrough: forward a value unchanged alongside what is derived from it.
//!
//! ```text
//!         -----------------------> x
//!        |
//!     x ---> [ inner description ] ----> y
//! ```
//!
//! The output is a tuple whose first element is the passthrough's own input.
//! In `Expand` mode a tuple-valued inner output is spliced in after it
//! (`(x, y0, y1, ..)`); in `Nested` mode the inner output stays one element
//! (`(x, y)`).

use crate::pipeline::description::Description;
use crate::pipeline::port::Arity;
use crate::pipeline::value::Value;

/// How the inner output is merged after the original input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassthroughMode {
    /// `(x, *inner)`.
    #[default]
    Expand,
    /// `(x, inner)`.
    Nested,
}

impl PassthroughMode {
    /// Output arity for an inner unit producing `inner`.
    pub fn output_arity(self, inner: Arity) -> Arity {
        match (self, inner) {
            (PassthroughMode::Expand, Arity::Tuple(n)) => Arity::Tuple(n + 1),
            _ => Arity::Tuple(2),
        }
    }

    /// Whether an inner output of arity `inner` is spliced element-wise.
    pub fn flattens(self, inner: Arity) -> bool {
        matches!((self, inner), (PassthroughMode::Expand, Arity::Tuple(_)))
    }
}

/// A passthrough wrapping an inner description.
pub struct Passthrough {
    pub(crate) inner: Box<Description>,
    pub(crate) mode: PassthroughMode,
    pub(crate) name: Option<String>,
}

impl Passthrough {
    pub fn new(inner: impl Into<Description>) -> Self {
        Self {
            inner: Box::new(inner.into()),
            mode: PassthroughMode::Expand,
            name: None,
        }
    }

    /// Keep the inner output as a single element: `(x, inner)`.
    pub fn nested(mut self) -> Self {
        self.mode = PassthroughMode::Nested;
        self
    }

    pub fn mode(mut self, mode: PassthroughMode) -> Self {
        self.mode = mode;
        self
    }

    /// Name this passthrough. Blocks inside it are then looked up as
    /// `"name/block"`.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn inner(&self) -> &Description {
        &self.inner
    }

    pub fn passthrough_mode(&self) -> PassthroughMode {
        self.mode
    }
}

impl std::fmt::Debug for Passthrough {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Passthrough")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("inner", &self.inner)
            .finish()
    }
}

/// Merge the original input with the inner output.
///
/// `flatten` is decided at compile time from the inner unit's arity.
pub(crate) fn splice(original: Value, derived: Value, flatten: bool) -> Value {
    match derived {
        Value::Tuple(items) if flatten => {
            let mut out = Vec::with_capacity(items.len() + 1);
            out.push(original);
            out.extend(items);
            Value::Tuple(out)
        }
        derived => Value::Tuple(vec![original, derived]),
    }
}
