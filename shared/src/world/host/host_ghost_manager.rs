use log::{debug, trace};

use crate::{
    connection::{ghost_config::GhostConfig, packet_notifiable::PacketNotifiable},
    constants::GHOST_EVICTION_MARGIN,
    types::{ConnectionKey, GhostIndex, PacketIndex},
    world::{
        host::{
            class_stats::ClassStats,
            ghost_record::GhostFlags,
            ghost_table::GhostTable,
            scope::{ScopeProvider, ScopeQuery},
            update_ledger::UpdateLedger,
        },
        object::net_object::NetObjectHandle,
    },
};

/// Host half of a ghost connection: the ghost table, the notify ledger and
/// the per-packet scoping pass
pub struct HostGhostManager {
    pub(crate) table: GhostTable,
    pub(crate) ledger: UpdateLedger,
    pub(crate) class_stats: ClassStats,
    pub(crate) removal_priority: f32,
    pub(crate) new_ghost_priority_boost: f32,
    pub(crate) debug_object_sizes: bool,
}

impl HostGhostManager {
    pub fn new(connection: ConnectionKey, config: &GhostConfig) -> Self {
        Self {
            table: GhostTable::new(connection, config.max_ghost_count),
            ledger: UpdateLedger::new(),
            class_stats: ClassStats::new(),
            removal_priority: config.removal_priority,
            new_ghost_priority_boost: config.new_ghost_priority_boost,
            debug_object_sizes: config.debug_object_sizes,
        }
    }

    pub fn connection(&self) -> ConnectionKey {
        self.table.connection()
    }

    pub fn table(&self) -> &GhostTable {
        &self.table
    }

    pub fn ledger(&self) -> &UpdateLedger {
        &self.ledger
    }

    pub fn class_stats(&self) -> &ClassStats {
        &self.class_stats
    }

    pub fn is_data_to_transmit(&self) -> bool {
        self.table.dirty_count() > 0
    }

    /// Publish index of `object`, once the peer has acknowledged its creation
    pub fn ghost_index(&self, object: &NetObjectHandle) -> Option<GhostIndex> {
        let index = self.table.index_of(object.id())?;
        self.table
            .get(index)
            .filter(|record| record.is_steady())
            .map(|record| record.index())
    }

    pub fn set_ghost_class_count(&mut self, class_count: u32) {
        self.table.set_class_count(class_count);
    }

    /// Runs ahead of every packet write: collects dirty marks from the
    /// simulation, resets scope on dirty records and lets `scope` re-mark
    /// relevant objects. Clean records keep their scope until they change,
    /// unless the table is close to full.
    pub fn prepare_write_packet(&mut self, scope: &mut dyn ScopeProvider) {
        self.collect_dirty_marks();

        let max_ghost_count = self.table.max_ghost_count();
        if self.table.live_count() > max_ghost_count.saturating_sub(GHOST_EVICTION_MARGIN) {
            self.evict_clean_out_of_scope();
        }

        let dirty: Vec<GhostIndex> = self.table.dirty_indices().to_vec();
        for index in dirty {
            let Some(record) = self.table.get_mut(index) else {
                continue;
            };
            record.skip_count = record.skip_count.saturating_add(1);
            if !record.flags.contains(GhostFlags::ALWAYS_IN_SCOPE) {
                record.flags.remove(GhostFlags::IN_SCOPE);
            }
        }

        let mut query = ScopeQuery::new(&mut self.table);
        scope.perform_scope_query(&mut query);
        trace!(
            "scope query on {:?}: {} live ghosts, {} dirty",
            self.table.connection(),
            self.table.live_count(),
            self.table.dirty_count()
        );
    }

    /// Detaches clean records the previous query left out of scope and
    /// resets scope on the rest, so the next query decides their fate
    fn evict_clean_out_of_scope(&mut self) {
        let clean: Vec<GhostIndex> = self.table.clean_indices().to_vec();
        let mut evicted = 0usize;
        for index in clean {
            let Some(record) = self.table.get_mut(index) else {
                continue;
            };
            if record.is_removal_pending() || record.flags.contains(GhostFlags::ALWAYS_IN_SCOPE) {
                continue;
            }
            if record.flags.contains(GhostFlags::IN_SCOPE) {
                record.flags.remove(GhostFlags::IN_SCOPE);
            } else {
                self.table.detach(index);
                evicted += 1;
            }
        }
        if evicted > 0 {
            debug!(
                "ghost table for {:?} is near capacity, evicted {evicted} clean ghosts",
                self.table.connection()
            );
        }
    }

    /// Moves bits marked through `NetObjectHandle::mark_dirty` into the
    /// records, and detaches records whose object was dropped
    pub fn collect_dirty_marks(&mut self) {
        let live: Vec<GhostIndex> = self.table.live_indices().to_vec();
        for index in live {
            let Some(receiver) = self
                .table
                .get(index)
                .and_then(|record| record.receiver.clone())
            else {
                continue;
            };
            let marked = receiver.take();
            if receiver.is_invalidated() {
                debug!("object behind ghost {index} was dropped, detaching");
                self.table.detach(index);
                continue;
            }
            if !marked.is_clear() {
                self.table.or_mask(index, marked);
            }
        }
    }

    /// Discards every record and in-flight notify record. Objects lose their
    /// link to this connection.
    pub fn clear(&mut self) {
        self.ledger.clear();
        let live: Vec<GhostIndex> = self.table.live_indices().to_vec();
        for index in live {
            if let Some(record) = self.table.get_mut(index) {
                record.outstanding.clear();
            }
            self.table.detach(index);
            self.table.reclaim(index);
        }
    }
}

impl PacketNotifiable for HostGhostManager {
    fn notify_packet_delivered(&mut self, packet_index: PacketIndex) {
        self.ledger
            .notify_packet_delivered(&mut self.table, packet_index);
    }

    fn notify_packet_dropped(&mut self, packet_index: PacketIndex) {
        self.ledger.notify_packet_dropped(&mut self.table, packet_index);
    }
}
