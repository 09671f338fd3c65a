use std::any::Any;

use ghostwire_serde::{BitReader, SerdeErr};

use crate::{
    types::{ConnectionKey, GhostIndex},
    world::remote::local_ghosts::LocalGhosts,
};

/// Receiving side of a replicable type: the shadow copy a peer keeps of an
/// object it is being ghosted.
pub trait Ghost: Send + 'static {
    /// Reads the fields written by the host's `pack_update`. `is_initial`
    /// is set for the update that creates the ghost.
    fn unpack_update(
        &mut self,
        context: &GhostContext,
        reader: &mut BitReader,
        is_initial: bool,
    ) -> Result<(), SerdeErr>;

    /// Called after construction, before the initial update is read
    fn on_ghost_add_before_update(&mut self, _context: &GhostContext) {}

    /// Called after the initial update. Returning false rejects the ghost
    /// and terminates the connection.
    fn on_ghost_add(&mut self, _context: &GhostContext) -> bool {
        true
    }

    /// Called before the ghost is released
    fn on_ghost_remove(&mut self, _context: &GhostContext) {}

    fn as_any(&self) -> &dyn Any;
}

/// Connection-scoped view handed to ghost hooks
pub struct GhostContext<'a> {
    connection: ConnectionKey,
    index: GhostIndex,
    ghosts: &'a LocalGhosts,
}

impl<'a> GhostContext<'a> {
    pub(crate) fn new(connection: ConnectionKey, index: GhostIndex, ghosts: &'a LocalGhosts) -> Self {
        Self {
            connection,
            index,
            ghosts,
        }
    }

    pub fn connection(&self) -> ConnectionKey {
        self.connection
    }

    /// Publish index of the ghost being called
    pub fn index(&self) -> GhostIndex {
        self.index
    }

    /// Another live ghost on the same connection. The ghost being called is
    /// not resolvable through its own context.
    pub fn resolve_ghost(&self, index: GhostIndex) -> Option<&dyn Ghost> {
        self.ghosts.get(index)
    }
}
