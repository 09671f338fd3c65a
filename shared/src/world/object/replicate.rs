use std::any::Any;

use ghostwire_serde::BitWrite;

use crate::{
    types::{ClassId, ConnectionKey},
    world::object::dirty_mask::DirtyMask,
};

/// Authoritative side of a replicable type. Owned by the simulation and
/// shared with every connection that ghosts it.
pub trait Replicate: Send + Sync + 'static {
    /// Position of this type in the `ClassKinds` registry
    fn class_id(&self) -> ClassId;

    /// Objects returning false are never brought into scope
    fn is_ghostable(&self) -> bool {
        true
    }

    /// Writes the fields selected by `mask`. Returns the bits that were not
    /// written and must be sent later, which must be a subset of `mask`.
    fn pack_update(
        &self,
        connection: ConnectionKey,
        mask: DirtyMask,
        is_initial: bool,
        writer: &mut dyn BitWrite,
    ) -> DirtyMask;

    fn update_priority(&self, _connection: ConnectionKey, _mask: DirtyMask, skip_count: u32) -> f32 {
        skip_count as f32 * 0.1
    }

    /// Called once the peer has acknowledged the creation of this ghost
    fn on_ghost_available(&self, _connection: ConnectionKey) {}

    fn as_any(&self) -> &dyn Any;
}
