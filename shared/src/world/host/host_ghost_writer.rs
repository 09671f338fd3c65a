use log::{trace, warn};

use ghostwire_serde::{BitWrite, BitWriter};

use crate::{
    constants::{GHOST_ID_BIT_OFFSET, GHOST_ID_BIT_SIZE, OBJECT_SIZE_BIT_SIZE},
    types::{GhostIndex, PacketIndex},
    world::{
        host::{
            ghost_record::GhostFlags, host_ghost_manager::HostGhostManager,
            update_ledger::UpdateKind,
        },
        object::dirty_mask::DirtyMask,
    },
};

/// Smallest index width able to carry `max_index`, never below the offset
/// encoded by the width field
pub fn index_bit_width(max_index: GhostIndex) -> u8 {
    let needed = (GhostIndex::BITS - max_index.leading_zeros()) as u8;
    needed.max(GHOST_ID_BIT_OFFSET)
}

pub struct HostGhostWriter;

impl HostGhostWriter {
    /// Writes as many pending ghost records as fit into `writer`, highest
    /// priority first, followed by the terminator bit.
    ///
    /// `has_written` tells whether the packet already carries data; while it
    /// is false an oversized first record is kept rather than leaving the
    /// packet empty.
    pub fn write_updates(
        manager: &mut HostGhostManager,
        writer: &mut BitWriter,
        packet_index: PacketIndex,
        class_bit_size: u8,
        has_written: &mut bool,
    ) {
        Self::detach_out_of_scope(manager);
        let (candidates, max_index) = Self::prioritize(manager);

        let connection = manager.table.connection();
        let index_bits = index_bit_width(max_index);
        let mut wrote_width = false;
        let mut written = 0usize;
        let start_position = writer.bit_position();

        writer.reserve_bits(1);

        for (_, index) in candidates {
            if writer.is_full() {
                break;
            }
            let Some(record) = manager.table.get(index) else {
                continue;
            };
            let flags = record.flags;
            if flags.intersects(GhostFlags::SENDING | GhostFlags::REMOVING) {
                continue;
            }
            let is_removal = flags.contains(GhostFlags::MARKED_FOR_REMOVAL);
            let is_initial = flags.contains(GhostFlags::NOT_YET_SENT);
            let mask = record.mask;
            let object = if is_removal {
                None
            } else {
                match record.object.as_ref().and_then(|weak| weak.upgrade()) {
                    Some(object) => Some(object),
                    None => continue,
                }
            };

            let update_start = writer.bit_position();
            writer.write_bit(true);
            if !wrote_width {
                writer.write_bits((index_bits - GHOST_ID_BIT_OFFSET) as u64, GHOST_ID_BIT_SIZE);
            }
            writer.write_bits(index as u64, index_bits);
            writer.write_bit(is_removal);

            let mut remaining = DirtyMask::EMPTY;
            let mut payload = None;
            if let Some(object) = object.as_ref() {
                let size_position = writer.bit_position();
                if manager.debug_object_sizes {
                    writer.advance_bit_position(OBJECT_SIZE_BIT_SIZE as u32);
                }
                writer.write_bit(is_initial);
                if is_initial {
                    writer.write_bits(object.class_id() as u64, class_bit_size);
                }
                let payload_start = writer.bit_position();
                remaining = object
                    .object()
                    .pack_update(connection, mask, is_initial, writer);
                assert!(
                    remaining.is_subset_of(mask),
                    "pack_update for class {} returned {:?}, which sets bits outside {:?}",
                    object.class_id(),
                    remaining,
                    mask
                );
                let end_position = writer.bit_position();
                if manager.debug_object_sizes {
                    writer.write_bits_at(end_position as u64, OBJECT_SIZE_BIT_SIZE, size_position);
                }
                payload = Some((object.class_id(), end_position - payload_start));
            }

            if writer.overflowed() {
                if *has_written {
                    writer.set_bit_position(update_start);
                    break;
                }
                warn!(
                    "ghost {index} does not fit into an empty packet ({} bits), sending it oversized",
                    writer.bit_position() - start_position
                );
            }
            if let Some((class_id, bits)) = payload {
                manager.class_stats.record(class_id, is_initial, bits);
            }
            *has_written = true;
            wrote_width = true;
            written += 1;

            if is_removal {
                if let Some(record) = manager.table.get_mut(index) {
                    record.flags.remove(GhostFlags::MARKED_FOR_REMOVAL);
                    record.flags.insert(GhostFlags::REMOVING);
                }
                manager.table.set_mask(index, DirtyMask::EMPTY);
                manager.ledger.record_write(
                    &mut manager.table,
                    packet_index,
                    index,
                    UpdateKind::Removal,
                    mask,
                );
            } else {
                let kind = if is_initial {
                    UpdateKind::Creation
                } else {
                    UpdateKind::Update
                };
                if let Some(record) = manager.table.get_mut(index) {
                    if is_initial {
                        record.flags.remove(GhostFlags::NOT_YET_SENT);
                        record.flags.insert(GhostFlags::SENDING);
                    }
                    record.skip_count = 0;
                }
                manager.table.set_mask(index, remaining);
                manager.ledger.record_write(
                    &mut manager.table,
                    packet_index,
                    index,
                    kind,
                    mask & !remaining,
                );
            }
        }

        writer.release_bits(1);
        writer.write_bit(false);

        trace!(
            "packet {packet_index}: wrote {written} ghosts in {} bits for {connection:?}",
            writer.bit_position() - start_position
        );
    }

    /// Detaches every dirty record the scope query did not keep
    fn detach_out_of_scope(manager: &mut HostGhostManager) {
        let dirty: Vec<GhostIndex> = manager.table.dirty_indices().to_vec();
        for index in dirty {
            let out_of_scope = manager.table.get(index).is_some_and(|record| {
                !record
                    .flags
                    .intersects(GhostFlags::IN_SCOPE | GhostFlags::ALWAYS_IN_SCOPE)
            });
            if out_of_scope {
                manager.table.detach(index);
            }
        }
    }

    /// Scores the dirty partition and returns it sorted by descending
    /// priority, ties broken by ascending publish index. Also returns the
    /// largest publish index among writable records.
    fn prioritize(manager: &mut HostGhostManager) -> (Vec<(f32, GhostIndex)>, GhostIndex) {
        let connection = manager.table.connection();
        let dirty: Vec<GhostIndex> = manager.table.dirty_indices().to_vec();
        let mut candidates = Vec::with_capacity(dirty.len());
        let mut max_index: GhostIndex = 0;

        for index in dirty {
            let object_dropped = manager.table.get(index).is_some_and(|record| {
                !record.is_removal_pending()
                    && !record
                        .object
                        .as_ref()
                        .is_some_and(|weak| weak.is_alive())
            });
            if object_dropped {
                manager.table.detach(index);
            }

            let Some(record) = manager.table.get(index) else {
                continue;
            };
            let flags = record.flags;
            if flags.contains(GhostFlags::MARKED_FOR_REMOVAL | GhostFlags::NOT_YET_SENT)
                && record.outstanding.is_empty()
            {
                manager.table.reclaim(index);
                continue;
            }

            let priority = if flags.intersects(GhostFlags::SENDING | GhostFlags::REMOVING) {
                0.0
            } else if flags.contains(GhostFlags::MARKED_FOR_REMOVAL) {
                manager.removal_priority
            } else {
                let Some(object) = record.object.as_ref().and_then(|weak| weak.upgrade()) else {
                    continue;
                };
                let mut priority =
                    object
                        .object()
                        .update_priority(connection, record.mask, record.skip_count);
                if flags.contains(GhostFlags::NOT_YET_SENT) {
                    priority += manager.new_ghost_priority_boost;
                }
                priority
            };

            if let Some(record) = manager.table.get_mut(index) {
                record.priority = priority;
            }
            if !flags.intersects(GhostFlags::SENDING | GhostFlags::REMOVING) {
                max_index = max_index.max(index);
                candidates.push((priority, index));
            }
        }

        candidates.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        (candidates, max_index)
    }
}
