//! HLO entity references.
//!
//! Instructions refer to their operands, and modules to their computations, through these
//! entity references rather than Rust references. Each is a `u32` index into the arena owning the
//! entity, with a separate type per entity kind so they can't be mixed up.
//!
//! The entity references implement `Display` in a way that matches the textual IR format.

use crate::entity::entity_impl;
use core::fmt;
#[cfg(feature = "enable-serde")]
use serde_derive::{Deserialize, Serialize};

/// An opaque reference to an instruction in a [`Computation`](super::Computation).
///
/// Instruction references are never reused: an instruction removed from its computation keeps
/// its number, and newly created instructions get fresh ones.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Inst(u32);
entity_impl!(Inst, "inst");

/// An opaque reference to a computation in a [`Module`](super::Module).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Comp(u32);
entity_impl!(Comp, "comp");

/// Identifier grouping communicating instructions across partitions into one logical
/// collective operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct ChannelId(u64);

impl ChannelId {
    /// Create a channel id from its number.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The number of this channel id.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for ChannelId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
