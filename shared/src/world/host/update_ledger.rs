use std::collections::HashMap;

use log::{debug, trace};

use crate::{
    types::{GhostIndex, PacketIndex},
    world::{
        host::{ghost_record::GhostFlags, ghost_table::GhostTable},
        object::{dirty_mask::DirtyMask, net_object::NetObjectHandle},
    },
};

pub type PendingKey = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateKind {
    /// First write of a ghost, carrying its class id
    Creation,
    Update,
    Removal,
}

/// Bits of one ghost carried by one unacknowledged packet
#[derive(Clone, Debug)]
pub struct PendingUpdate {
    pub ghost: GhostIndex,
    pub kind: UpdateKind,
    /// Bits written into the packet
    pub mask: DirtyMask,
    /// Bits since delivered by a later packet
    pub superseded: DirtyMask,
}

/// Remembers which ghost bits every in-flight packet carried, and restores
/// or retires them once the transport reports the packet's fate. Packets may
/// be reported in any order.
#[derive(Default)]
pub struct UpdateLedger {
    next_key: PendingKey,
    pending: HashMap<PendingKey, PendingUpdate>,
    sent_packets: HashMap<PacketIndex, Vec<PendingKey>>,
}

impl UpdateLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_packet_outstanding(&self, packet_index: PacketIndex) -> bool {
        self.sent_packets.contains_key(&packet_index)
    }

    pub fn get(&self, key: PendingKey) -> Option<&PendingUpdate> {
        self.pending.get(&key)
    }

    /// Appends a notify record to `packet_index` and to the ghost's own
    /// chain of outstanding writes
    pub fn record_write(
        &mut self,
        table: &mut GhostTable,
        packet_index: PacketIndex,
        ghost: GhostIndex,
        kind: UpdateKind,
        mask: DirtyMask,
    ) {
        let Some(record) = table.get_mut(ghost) else {
            return;
        };
        let key = self.next_key;
        self.next_key = self.next_key.wrapping_add(1);
        record.outstanding.push(key);
        self.pending.insert(
            key,
            PendingUpdate {
                ghost,
                kind,
                mask,
                superseded: DirtyMask::EMPTY,
            },
        );
        self.sent_packets.entry(packet_index).or_default().push(key);
    }

    pub fn notify_packet_delivered(&mut self, table: &mut GhostTable, packet_index: PacketIndex) {
        let Some(keys) = self.sent_packets.remove(&packet_index) else {
            return;
        };
        trace!(
            "packet {packet_index} delivered with {} ghost updates",
            keys.len()
        );
        let connection = table.connection();
        let mut available: Vec<NetObjectHandle> = Vec::new();

        for key in keys {
            let Some(update) = self.pending.remove(&key) else {
                continue;
            };
            let Some(record) = table.get_mut(update.ghost) else {
                continue;
            };
            let Some(position) = record.outstanding.iter().position(|k| *k == key) else {
                continue;
            };
            record.outstanding.remove(position);
            for earlier in record.outstanding[..position].iter() {
                if let Some(pending) = self.pending.get_mut(earlier) {
                    pending.superseded |= update.mask;
                }
            }

            let mut reclaim = false;
            match update.kind {
                UpdateKind::Creation => {
                    record.flags.remove(GhostFlags::SENDING);
                    if !record.is_removal_pending() {
                        if let Some(object) = record.object.as_ref().and_then(|weak| weak.upgrade()) {
                            available.push(object);
                        }
                    }
                    debug!("ghost {} creation acknowledged on {connection:?}", update.ghost);
                }
                UpdateKind::Update => {}
                UpdateKind::Removal => {
                    record.flags.remove(GhostFlags::REMOVING);
                    if record.outstanding.is_empty() {
                        reclaim = true;
                    } else {
                        record.flags.insert(GhostFlags::RECLAIM_DEFERRED);
                    }
                }
            }
            if record.flags.contains(GhostFlags::RECLAIM_DEFERRED) && record.outstanding.is_empty()
            {
                reclaim = true;
            }
            if reclaim {
                table.reclaim(update.ghost);
            }
        }

        for object in available {
            object.object().on_ghost_available(connection);
        }
    }

    pub fn notify_packet_dropped(&mut self, table: &mut GhostTable, packet_index: PacketIndex) {
        let Some(keys) = self.sent_packets.remove(&packet_index) else {
            return;
        };
        trace!(
            "packet {packet_index} dropped with {} ghost updates",
            keys.len()
        );

        for key in keys {
            let Some(update) = self.pending.remove(&key) else {
                continue;
            };
            let Some(record) = table.get_mut(update.ghost) else {
                continue;
            };
            let Some(position) = record.outstanding.iter().position(|k| *k == key) else {
                continue;
            };
            record.outstanding.remove(position);

            let mut resent = DirtyMask::EMPTY;
            for later in record.outstanding[position..].iter() {
                if let Some(pending) = self.pending.get(later) {
                    resent |= pending.mask;
                }
            }
            let survivors = update.mask & !update.superseded & !resent;
            let removal_pending = record.is_removal_pending();
            let deferred = record.flags.contains(GhostFlags::RECLAIM_DEFERRED)
                && record.outstanding.is_empty();

            let restore = match update.kind {
                UpdateKind::Creation => {
                    record.flags.remove(GhostFlags::SENDING);
                    record.flags.insert(GhostFlags::NOT_YET_SENT);
                    (!removal_pending).then_some(DirtyMask::ALL)
                }
                UpdateKind::Update => {
                    (!removal_pending && !survivors.is_clear()).then_some(survivors)
                }
                UpdateKind::Removal => {
                    record.flags.remove(GhostFlags::REMOVING);
                    record.flags.insert(GhostFlags::MARKED_FOR_REMOVAL);
                    Some(DirtyMask::ALL)
                }
            };
            if deferred {
                table.reclaim(update.ghost);
            } else if let Some(mask) = restore {
                table.or_mask(update.ghost, mask);
            }
        }
    }

    /// Forgets every in-flight packet. Ghost records still list the dropped
    /// keys, so the table must be cleared alongside.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.sent_packets.clear();
    }
}
