//! Identity types for the pipeline system.
//!
//! All IDs are newtypes over `u32` that serve as direct array indices
//! into their respective storage vectors, providing O(1) lookup.

use serde::Serialize;
use std::fmt;

/// Index into `Graph::nodes` (and the hook registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Index into the executor's value slots.
///
/// Slot 0 always holds the graph input. Every other slot is written by
/// exactly one step of the compiled plan.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SlotId(pub u32);

impl SlotId {
    pub const INPUT: SlotId = SlotId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INPUT {
            write!(f, "SlotId(INPUT)")
        } else {
            write!(f, "SlotId({})", self.0)
        }
    }
}
