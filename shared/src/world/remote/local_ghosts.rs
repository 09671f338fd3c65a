use log::debug;

use crate::{
    types::{ConnectionKey, GhostIndex},
    world::object::ghost::{Ghost, GhostContext},
};

/// Receiver-side table from publish index to live ghost. Grows on demand;
/// destroyed ghosts leave an empty slot behind.
#[derive(Default)]
pub struct LocalGhosts {
    slots: Vec<Option<Box<dyn Ghost>>>,
    live: usize,
}

impl LocalGhosts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: GhostIndex) -> Option<&dyn Ghost> {
        self.slots.get(index as usize)?.as_deref()
    }

    pub fn get_as<G: Ghost>(&self, index: GhostIndex) -> Option<&G> {
        self.get(index)?.as_any().downcast_ref::<G>()
    }

    pub fn is_live(&self, index: GhostIndex) -> bool {
        self.get(index).is_some()
    }

    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Number of slots ever allocated, live or not
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn live_indices(&self) -> impl Iterator<Item = GhostIndex> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| index as GhostIndex)
    }

    pub(crate) fn take(&mut self, index: GhostIndex) -> Option<Box<dyn Ghost>> {
        let ghost = self.slots.get_mut(index as usize)?.take();
        if ghost.is_some() {
            self.live -= 1;
        }
        ghost
    }

    pub(crate) fn put(&mut self, index: GhostIndex, ghost: Box<dyn Ghost>) {
        let slot = index as usize;
        if slot >= self.slots.len() {
            self.slots.resize_with(slot + 1, || None);
        }
        if self.slots[slot].replace(ghost).is_none() {
            self.live += 1;
        }
    }

    /// Releases every ghost, invoking its removal hook
    pub fn clear(&mut self, connection: ConnectionKey) {
        let indices: Vec<GhostIndex> = self.live_indices().collect();
        for index in indices {
            if let Some(mut ghost) = self.take(index) {
                let context = GhostContext::new(connection, index, self);
                ghost.on_ghost_remove(&context);
            }
        }
        self.slots.clear();
        debug!("released all local ghosts on {connection:?}");
    }
}
