use std::sync::Arc;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::{
    types::{GhostIndex, ObjectId},
    world::{
        host::update_ledger::PendingKey,
        object::{dirty_mask::DirtyMask, dirty_receiver::DirtyReceiver, net_object::WeakNetObject},
    },
};

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct GhostFlags: u8 {
        /// Creation has never been written to a packet
        const NOT_YET_SENT = 1 << 0;
        /// Creation is in flight and not yet acknowledged
        const SENDING = 1 << 1;
        /// Removal must be written to the next packet
        const MARKED_FOR_REMOVAL = 1 << 2;
        /// Removal is in flight and not yet acknowledged
        const REMOVING = 1 << 3;
        const IN_SCOPE = 1 << 4;
        const ALWAYS_IN_SCOPE = 1 << 5;
        /// Removal was acknowledged while older notify records are still
        /// outstanding; the slot is reclaimed once they resolve
        const RECLAIM_DEFERRED = 1 << 6;
    }
}

/// Per-connection replication state for one object
#[derive(Debug)]
pub struct GhostRecord {
    /// Publish index, stable for the record's life
    pub(crate) index: GhostIndex,
    /// Position in the partitioned array
    pub(crate) array_index: usize,
    pub(crate) mask: DirtyMask,
    pub(crate) flags: GhostFlags,
    pub(crate) priority: f32,
    pub(crate) skip_count: u32,
    pub(crate) object: Option<WeakNetObject>,
    pub(crate) object_id: Option<ObjectId>,
    pub(crate) receiver: Option<Arc<DirtyReceiver>>,
    /// Notify records carrying this ghost, oldest first
    pub(crate) outstanding: SmallVec<[PendingKey; 4]>,
}

impl GhostRecord {
    pub(crate) fn new(index: GhostIndex) -> Self {
        Self {
            index,
            array_index: index as usize,
            mask: DirtyMask::EMPTY,
            flags: GhostFlags::empty(),
            priority: 0.0,
            skip_count: 0,
            object: None,
            object_id: None,
            receiver: None,
            outstanding: SmallVec::new(),
        }
    }

    pub fn index(&self) -> GhostIndex {
        self.index
    }

    pub fn mask(&self) -> DirtyMask {
        self.mask
    }

    pub fn flags(&self) -> GhostFlags {
        self.flags
    }

    pub fn skip_count(&self) -> u32 {
        self.skip_count
    }

    pub fn object_id(&self) -> Option<ObjectId> {
        self.object_id
    }

    pub fn outstanding_count(&self) -> usize {
        self.outstanding.len()
    }

    /// Creation acknowledged and no removal under way
    pub fn is_steady(&self) -> bool {
        !self.flags.intersects(
            GhostFlags::NOT_YET_SENT
                | GhostFlags::SENDING
                | GhostFlags::MARKED_FOR_REMOVAL
                | GhostFlags::REMOVING
                | GhostFlags::RECLAIM_DEFERRED,
        )
    }

    pub(crate) fn is_removal_pending(&self) -> bool {
        self.flags.intersects(
            GhostFlags::MARKED_FOR_REMOVAL | GhostFlags::REMOVING | GhostFlags::RECLAIM_DEFERRED,
        )
    }
}
