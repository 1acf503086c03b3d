//! Modules and module-wide channel id bookkeeping.

use crate::computation::Computation;
use crate::entities::{ChannelId, Comp};
use crate::entity::PrimaryMap;
#[cfg(feature = "enable-serde")]
use serde_derive::{Deserialize, Serialize};

/// A module owns an ordered collection of computations.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Module {
    name: String,
    computations: PrimaryMap<Comp, Computation>,
    entry: Option<Comp>,
}

impl Module {
    /// Create a new empty module.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            computations: PrimaryMap::new(),
            entry: None,
        }
    }

    /// The name of this module.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a computation. The first computation added becomes the entry computation.
    pub fn add_computation(&mut self, computation: Computation) -> Comp {
        let comp = self.computations.push(computation);
        self.entry.get_or_insert(comp);
        comp
    }

    /// The entry computation.
    pub fn entry(&self) -> Option<Comp> {
        self.entry
    }

    /// Get a computation.
    pub fn computation(&self, comp: Comp) -> &Computation {
        &self.computations[comp]
    }

    /// Iterate over the computations in the order they were added.
    pub fn computations(&self) -> impl Iterator<Item = (Comp, &Computation)> {
        self.computations.iter()
    }

    /// Iterate mutably over the computations in the order they were added.
    pub fn computations_mut(&mut self) -> impl Iterator<Item = (Comp, &mut Computation)> {
        self.computations.iter_mut()
    }

    /// Iterate over the channel ids of every communicating instruction in the module.
    pub fn channel_ids(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.computations.values().flat_map(|comp| {
            comp.instructions()
                .filter_map(|inst| comp.inst_data(inst).channel_id())
        })
    }

    /// The smallest channel id greater than every channel id used in the module, or 1 when no
    /// instruction has a channel id.
    pub fn next_channel_id(&self) -> ChannelId {
        let next = self
            .channel_ids()
            .map(|id| id.as_u64() + 1)
            .max()
            .unwrap_or(1);
        ChannelId::new(next)
    }
}

/// Hands out fresh channel ids for the duration of one pass over a module.
///
/// The allocator is seeded from the channel ids present in the module when the pass starts, and
/// every id it returns is strictly greater than all of them and than every id returned before.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelIdAllocator {
    next: ChannelId,
}

impl ChannelIdAllocator {
    /// Create an allocator whose first id is `next`.
    pub fn new(next: ChannelId) -> Self {
        Self { next }
    }

    /// Create an allocator for `module`, starting above every channel id it uses.
    pub fn for_module(module: &Module) -> Self {
        Self::new(module.next_channel_id())
    }

    /// The id the next call to `allocate` will return.
    pub fn peek(&self) -> ChannelId {
        self.next
    }

    /// Allocate a fresh channel id.
    pub fn allocate(&mut self) -> ChannelId {
        let id = self.next;
        self.next = ChannelId::new(id.as_u64() + 1);
        id
    }
}

impl Default for ChannelIdAllocator {
    fn default() -> Self {
        Self::new(ChannelId::new(1))
    }
}
