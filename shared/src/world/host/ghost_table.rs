use std::{collections::HashMap, sync::Arc};

use log::{debug, trace, warn};

use crate::{
    constants::MAX_GHOST_COUNT,
    types::{ClassId, ConnectionKey, GhostIndex, ObjectId},
    world::{
        host::{
            error::GhostTableError,
            ghost_record::{GhostFlags, GhostRecord},
        },
        object::{dirty_mask::DirtyMask, dirty_receiver::DirtyReceiver, net_object::NetObjectHandle},
    },
};

/// Per-connection registry of ghost records.
///
/// Records live in `records`, addressed by publish index. `array` holds the
/// publish indices in partition order:
/// `[0, zero_update_index)` dirty, `[zero_update_index, free_index)` clean,
/// `[free_index, len)` free for reuse.
pub struct GhostTable {
    connection: ConnectionKey,
    records: Vec<GhostRecord>,
    array: Vec<GhostIndex>,
    zero_update_index: usize,
    free_index: usize,
    lookup: HashMap<ObjectId, GhostIndex>,
    max_ghost_count: usize,
    class_count: u32,
}

impl GhostTable {
    pub fn new(connection: ConnectionKey, max_ghost_count: usize) -> Self {
        Self {
            connection,
            records: Vec::new(),
            array: Vec::new(),
            zero_update_index: 0,
            free_index: 0,
            lookup: HashMap::new(),
            max_ghost_count: max_ghost_count.min(MAX_GHOST_COUNT),
            class_count: ClassId::MAX,
        }
    }

    /// Limits scoping to classes both peers know about
    pub fn set_class_count(&mut self, class_count: u32) {
        self.class_count = class_count;
    }

    pub fn class_count(&self) -> u32 {
        self.class_count
    }

    pub fn connection(&self) -> ConnectionKey {
        self.connection
    }

    pub fn max_ghost_count(&self) -> usize {
        self.max_ghost_count
    }

    /// Number of records that are not free
    pub fn live_count(&self) -> usize {
        self.free_index
    }

    pub fn dirty_count(&self) -> usize {
        self.zero_update_index
    }

    pub fn is_empty(&self) -> bool {
        self.free_index == 0
    }

    pub fn dirty_indices(&self) -> &[GhostIndex] {
        &self.array[..self.zero_update_index]
    }

    pub fn clean_indices(&self) -> &[GhostIndex] {
        &self.array[self.zero_update_index..self.free_index]
    }

    pub fn live_indices(&self) -> &[GhostIndex] {
        &self.array[..self.free_index]
    }

    pub fn get(&self, index: GhostIndex) -> Option<&GhostRecord> {
        self.records
            .get(index as usize)
            .filter(|record| record.array_index < self.free_index)
    }

    pub(crate) fn get_mut(&mut self, index: GhostIndex) -> Option<&mut GhostRecord> {
        let free_index = self.free_index;
        self.records
            .get_mut(index as usize)
            .filter(|record| record.array_index < free_index)
    }

    pub fn index_of(&self, object_id: ObjectId) -> Option<GhostIndex> {
        self.lookup.get(&object_id).copied()
    }

    pub fn is_dirty(&self, index: GhostIndex) -> bool {
        self.records
            .get(index as usize)
            .is_some_and(|record| record.array_index < self.zero_update_index)
    }

    /// Marks an object as relevant this round, allocating a record for it on
    /// first sight. Returns `None` when the object is not ghostable, its
    /// class is not shared with the peer, or the table is full.
    pub fn bring_into_scope(&mut self, object: &NetObjectHandle) -> Option<GhostIndex> {
        if !object.object().is_ghostable() {
            return None;
        }
        if object.class_id() >= self.class_count {
            trace!(
                "class {} of {:?} is not shared with connection {:?}, {} classes negotiated",
                object.class_id(),
                object.id(),
                self.connection,
                self.class_count
            );
            return None;
        }
        if let Some(index) = self.index_of(object.id()) {
            if let Some(record) = self.get_mut(index) {
                record.flags.insert(GhostFlags::IN_SCOPE);
            }
            return Some(index);
        }
        let index = self.allocate(object);
        if index.is_none() {
            warn!(
                "ghost table for connection {:?} is full ({} ghosts), {:?} stays out of scope",
                self.connection,
                self.max_ghost_count,
                object.id()
            );
        }
        index
    }

    fn allocate(&mut self, object: &NetObjectHandle) -> Option<GhostIndex> {
        if self.free_index >= self.max_ghost_count {
            return None;
        }
        if self.free_index == self.array.len() {
            let index = self.records.len() as GhostIndex;
            self.records.push(GhostRecord::new(index));
            self.array.push(index);
        }

        let index = self.array[self.free_index];
        self.push_free_to_zero(index);

        let receiver = Arc::new(DirtyReceiver::new());
        let record = &mut self.records[index as usize];
        debug_assert!(record.outstanding.is_empty());
        record.mask = DirtyMask::ALL;
        record.flags = GhostFlags::NOT_YET_SENT | GhostFlags::IN_SCOPE;
        record.priority = 0.0;
        record.skip_count = 0;
        record.object = Some(object.downgrade());
        record.object_id = Some(object.id());
        record.receiver = Some(receiver.clone());
        self.push_non_zero(index);

        object.link_ghost(self.connection, receiver);
        self.lookup.insert(object.id(), index);
        Some(index)
    }

    pub fn set_always_in_scope(&mut self, index: GhostIndex, always: bool) {
        if let Some(record) = self.get_mut(index) {
            record.flags.set(GhostFlags::ALWAYS_IN_SCOPE, always);
            if always {
                record.flags.insert(GhostFlags::IN_SCOPE);
            }
        }
    }

    /// Replaces the dirty mask, moving the record across the dirty/clean
    /// boundary when its emptiness changes
    pub fn set_mask(&mut self, index: GhostIndex, mask: DirtyMask) {
        let Some(record) = self.get_mut(index) else {
            return;
        };
        let was_clear = record.mask.is_clear();
        record.mask = mask;
        match (was_clear, mask.is_clear()) {
            (true, false) => self.push_non_zero(index),
            (false, true) => self.push_to_zero(index),
            _ => {}
        }
    }

    pub fn or_mask(&mut self, index: GhostIndex, mask: DirtyMask) {
        if let Some(record) = self.get(index) {
            let merged = record.mask | mask;
            self.set_mask(index, merged);
        }
    }

    /// Schedules the ghost for removal and cuts its link to the object. The
    /// record stays in the table until the removal is acknowledged.
    /// Calling it again before `reclaim` does nothing.
    pub fn detach(&mut self, index: GhostIndex) {
        let connection = self.connection;
        let Some(record) = self.get_mut(index) else {
            return;
        };
        if record.is_removal_pending() {
            return;
        }
        record.flags.insert(GhostFlags::MARKED_FOR_REMOVAL);
        record.flags.remove(GhostFlags::IN_SCOPE | GhostFlags::ALWAYS_IN_SCOPE);
        let was_clear = record.mask.is_clear();
        if was_clear {
            record.mask = DirtyMask::ALL;
        }
        let object = record.object.take();
        let object_id = record.object_id.take();
        record.receiver = None;
        if was_clear {
            self.push_non_zero(index);
        }
        self.unlink(connection, index, object.and_then(|weak| weak.upgrade()), object_id);
    }

    /// Returns the slot to the free region. The publish index becomes
    /// available for a new object.
    pub fn reclaim(&mut self, index: GhostIndex) {
        let connection = self.connection;
        let Some(record) = self.get_mut(index) else {
            return;
        };
        debug_assert!(
            record.outstanding.is_empty(),
            "reclaiming ghost {index} with outstanding notify records"
        );
        let was_dirty = !record.mask.is_clear();
        record.mask = DirtyMask::EMPTY;
        record.flags = GhostFlags::empty();
        record.priority = 0.0;
        record.skip_count = 0;
        record.receiver = None;
        record.outstanding.clear();
        let object = record.object.take();
        let object_id = record.object_id.take();
        if was_dirty {
            self.push_to_zero(index);
        }
        self.push_zero_to_free(index);
        self.unlink(connection, index, object.and_then(|weak| weak.upgrade()), object_id);
        debug!("ghost {index} reclaimed on connection {connection:?}");
    }

    fn unlink(
        &mut self,
        connection: ConnectionKey,
        index: GhostIndex,
        object: Option<NetObjectHandle>,
        object_id: Option<ObjectId>,
    ) {
        if let Some(object) = object {
            object.unlink_ghost(connection);
        }
        if let Some(object_id) = object_id {
            if self.lookup.get(&object_id) == Some(&index) {
                self.lookup.remove(&object_id);
            }
        }
    }

    /// Verifies the partition layout and the lookup map
    pub fn check_invariants(&self) -> Result<(), GhostTableError> {
        let len = self.array.len();
        if self.zero_update_index > self.free_index
            || self.free_index > len
            || len != self.records.len()
        {
            return Err(GhostTableError::BoundsOutOfOrder {
                zero_update_index: self.zero_update_index,
                free_index: self.free_index,
                len,
            });
        }
        if self.free_index > self.max_ghost_count {
            return Err(GhostTableError::CapacityExceeded {
                live: self.free_index,
                max: self.max_ghost_count,
            });
        }
        for (position, &index) in self.array.iter().enumerate() {
            let record = self
                .records
                .get(index as usize)
                .ok_or(GhostTableError::IndexMismatch { position, index })?;
            if record.array_index != position || record.index != index {
                return Err(GhostTableError::IndexMismatch { position, index });
            }
            if position < self.zero_update_index && record.mask.is_clear() {
                return Err(GhostTableError::DirtyRecordClean { index });
            }
            if position >= self.zero_update_index
                && position < self.free_index
                && !record.mask.is_clear()
            {
                return Err(GhostTableError::CleanRecordDirty { index });
            }
            if position >= self.free_index
                && (!record.flags.is_empty()
                    || !record.outstanding.is_empty()
                    || record.object.is_some())
            {
                return Err(GhostTableError::FreeRecordInUse { index });
            }
        }
        for (object_id, &index) in self.lookup.iter() {
            let linked = self
                .get(index)
                .is_some_and(|record| record.object_id == Some(*object_id));
            if !linked {
                return Err(GhostTableError::LookupMismatch {
                    object_id: *object_id,
                    index,
                });
            }
        }
        Ok(())
    }

    // Partition moves

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.array.swap(a, b);
        let (index_a, index_b) = (self.array[a], self.array[b]);
        self.records[index_a as usize].array_index = a;
        self.records[index_b as usize].array_index = b;
    }

    /// clean -> dirty
    fn push_non_zero(&mut self, index: GhostIndex) {
        let position = self.records[index as usize].array_index;
        debug_assert!(position >= self.zero_update_index && position < self.free_index);
        self.swap(position, self.zero_update_index);
        self.zero_update_index += 1;
    }

    /// dirty -> clean
    fn push_to_zero(&mut self, index: GhostIndex) {
        let position = self.records[index as usize].array_index;
        debug_assert!(position < self.zero_update_index);
        self.zero_update_index -= 1;
        self.swap(position, self.zero_update_index);
    }

    /// clean -> free
    fn push_zero_to_free(&mut self, index: GhostIndex) {
        let position = self.records[index as usize].array_index;
        debug_assert!(position >= self.zero_update_index && position < self.free_index);
        self.free_index -= 1;
        self.swap(position, self.free_index);
    }

    /// free -> clean
    fn push_free_to_zero(&mut self, index: GhostIndex) {
        let position = self.records[index as usize].array_index;
        debug_assert!(position >= self.free_index);
        self.swap(position, self.free_index);
        self.free_index += 1;
    }
}
