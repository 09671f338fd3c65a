use std::sync::Arc;

use log::{info, warn};

use ghostwire_serde::{BitReader, BitWrite, BitWriter, Serde};

use crate::{
    connection::{
        error::GhostingError, ghosting_message::GhostingMessage,
        packet_notifiable::PacketNotifiable,
    },
    constants::DEBUG_CHECKSUM,
    protocol::Protocol,
    types::{ConnectionKey, GhostIndex, PacketIndex},
    world::{
        host::{
            class_stats::ClassStats, host_ghost_manager::HostGhostManager,
            host_ghost_writer::HostGhostWriter, scope::ScopeProvider,
        },
        object::{class_kinds::class_bit_size, ghost::Ghost, net_object::NetObjectHandle},
        remote::{
            error::GhostReadError, local_ghosts::LocalGhosts,
            remote_ghost_reader::RemoteGhostReader,
        },
    },
};

/// Ghosting state of one connection, in both directions: a host side that
/// replicates local objects to the peer, and a receiver side holding the
/// peer's ghosts
pub struct GhostConnection {
    key: ConnectionKey,
    protocol: Arc<Protocol>,
    ghost_class_count: u32,
    host: HostGhostManager,
    local_ghosts: LocalGhosts,
    ghost_from: bool,
    ghost_to: bool,
    ghosting: bool,
    ghosting_sequence: u32,
    termination_reason: Option<GhostReadError>,
}

impl GhostConnection {
    pub fn new(key: ConnectionKey, protocol: Arc<Protocol>) -> Self {
        let mut host = HostGhostManager::new(key, &protocol.ghost);
        let ghost_class_count = protocol.class_count();
        host.set_ghost_class_count(ghost_class_count);
        Self {
            key,
            protocol,
            ghost_class_count,
            host,
            local_ghosts: LocalGhosts::new(),
            ghost_from: false,
            ghost_to: false,
            ghosting: false,
            ghosting_sequence: 0,
            termination_reason: None,
        }
    }

    pub fn key(&self) -> ConnectionKey {
        self.key
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    // Roles

    pub fn set_ghost_from(&mut self, ghost_from: bool) {
        if self.ghost_from == ghost_from {
            return;
        }
        if !ghost_from {
            self.ghosting = false;
            self.clear_ghost_info();
        }
        self.ghost_from = ghost_from;
    }

    pub fn set_ghost_to(&mut self, ghost_to: bool) {
        if self.ghost_to == ghost_to {
            return;
        }
        if !ghost_to {
            self.delete_local_ghosts();
        }
        self.ghost_to = ghost_to;
    }

    pub fn does_ghost_from(&self) -> bool {
        self.ghost_from
    }

    pub fn does_ghost_to(&self) -> bool {
        self.ghost_to
    }

    pub fn is_ghosting(&self) -> bool {
        self.ghosting
    }

    pub fn ghosting_sequence(&self) -> u32 {
        self.ghosting_sequence
    }

    // Class negotiation

    pub fn local_class_count(&self) -> u32 {
        self.protocol.class_count()
    }

    /// Class count agreed with the peer; bounds every class id on the wire
    pub fn ghost_class_count(&self) -> u32 {
        self.ghost_class_count
    }

    pub(crate) fn set_ghost_class_count(&mut self, count: u32) {
        self.ghost_class_count = count;
        self.host.set_ghost_class_count(count);
    }

    pub fn class_bit_size(&self) -> u8 {
        class_bit_size(self.ghost_class_count)
    }

    // Session control

    /// Begins a new ghosting session. The returned message must reach the
    /// peer, whose `ReadyForNormalGhosts` reply enables packet writing.
    pub fn activate_ghosting(&mut self) -> Result<GhostingMessage, GhostingError> {
        if !self.ghost_from {
            return Err(GhostingError::NotGhostingFrom {
                operation: "activate ghosting",
            });
        }
        self.ghosting_sequence = self.ghosting_sequence.wrapping_add(1);
        info!(
            "activating ghosting on {:?}, sequence {}",
            self.key, self.ghosting_sequence
        );
        Ok(GhostingMessage::StartGhosting {
            sequence: self.ghosting_sequence,
        })
    }

    /// Ends the session, dropping every ghost record. The returned message
    /// tells the peer to release its ghosts.
    pub fn reset_ghosting(&mut self) -> Result<GhostingMessage, GhostingError> {
        if !self.ghost_from {
            return Err(GhostingError::NotGhostingFrom {
                operation: "reset ghosting",
            });
        }
        self.ghosting = false;
        self.ghosting_sequence = self.ghosting_sequence.wrapping_add(1);
        self.clear_ghost_info();
        info!("reset ghosting on {:?}", self.key);
        Ok(GhostingMessage::EndGhosting)
    }

    /// Handles a session control message from the peer, returning the reply
    /// to send back, if any
    pub fn receive_ghosting_message(
        &mut self,
        message: GhostingMessage,
    ) -> Result<Option<GhostingMessage>, GhostingError> {
        match message {
            GhostingMessage::StartGhosting { sequence } => {
                if !self.ghost_to {
                    return Err(GhostingError::NotGhostingTo {
                        operation: "start ghosting",
                    });
                }
                Ok(Some(GhostingMessage::ReadyForNormalGhosts { sequence }))
            }
            GhostingMessage::ReadyForNormalGhosts { sequence } => {
                if !self.ghost_from {
                    return Err(GhostingError::NotGhostingFrom {
                        operation: "accept ready for normal ghosts",
                    });
                }
                if sequence != self.ghosting_sequence {
                    info!(
                        "ignoring ready for ghosting sequence {sequence}, current is {}",
                        self.ghosting_sequence
                    );
                    return Ok(None);
                }
                self.ghosting = true;
                info!("ghosting started on {:?}", self.key);
                Ok(None)
            }
            GhostingMessage::EndGhosting => {
                if !self.ghost_to {
                    return Err(GhostingError::NotGhostingTo {
                        operation: "end ghosting",
                    });
                }
                self.delete_local_ghosts();
                Ok(None)
            }
        }
    }

    // Writing

    /// Resets scope and runs `scope` against this connection. Does nothing
    /// unless a session is active.
    pub fn prepare_write_packet(&mut self, scope: &mut dyn ScopeProvider) {
        if !self.ghost_from || !self.ghosting {
            return;
        }
        self.host.prepare_write_packet(scope);
    }

    pub fn write_packet(
        &mut self,
        writer: &mut BitWriter,
        packet_index: PacketIndex,
        has_written: &mut bool,
    ) {
        if self.protocol.ghost.debug_object_sizes {
            DEBUG_CHECKSUM.ser(writer);
        }
        if !self.ghost_from {
            return;
        }
        writer.write_bit(self.ghosting);
        if !self.ghosting {
            return;
        }
        let class_bit_size = self.class_bit_size();
        HostGhostWriter::write_updates(
            &mut self.host,
            writer,
            packet_index,
            class_bit_size,
            has_written,
        );
    }

    pub fn is_data_to_transmit(&self) -> bool {
        self.ghosting && self.host.is_data_to_transmit()
    }

    // Reading

    /// Applies the ghost section of an incoming packet. A failure is fatal:
    /// it is stored as the termination reason and every later read fails
    /// with it.
    pub fn read_packet(&mut self, reader: &mut BitReader) -> Result<(), GhostReadError> {
        if let Some(reason) = self.termination_reason.as_ref() {
            return Err(reason.clone());
        }
        let result = self.read_ghost_section(reader);
        if let Err(err) = result.as_ref() {
            warn!("terminating {:?}: {err}", self.key);
            self.termination_reason = Some(err.clone());
        }
        result
    }

    fn read_ghost_section(&mut self, reader: &mut BitReader) -> Result<(), GhostReadError> {
        if self.protocol.ghost.debug_object_sizes {
            let checksum = u32::de(reader)?;
            if checksum != DEBUG_CHECKSUM {
                return Err(GhostReadError::DebugChecksumMismatch { found: checksum });
            }
        }
        if !self.ghost_to {
            return Ok(());
        }
        if !bool::de(reader)? {
            return Ok(());
        }
        RemoteGhostReader::read_updates(
            &mut self.local_ghosts,
            &self.protocol.class_kinds,
            self.ghost_class_count,
            self.key,
            self.protocol.ghost.debug_object_sizes,
            reader,
        )
    }

    pub fn termination_reason(&self) -> Option<&GhostReadError> {
        self.termination_reason.as_ref()
    }

    // Lookups

    pub fn ghost_index(&self, object: &NetObjectHandle) -> Option<GhostIndex> {
        self.host.ghost_index(object)
    }

    pub fn resolve_ghost(&self, index: GhostIndex) -> Option<&dyn Ghost> {
        self.local_ghosts.get(index)
    }

    pub fn local_ghosts(&self) -> &LocalGhosts {
        &self.local_ghosts
    }

    pub fn host(&self) -> &HostGhostManager {
        &self.host
    }

    pub fn class_stats(&self) -> &ClassStats {
        self.host.class_stats()
    }

    // Teardown

    /// Drops every ghost record and pending notify record
    pub fn clear_ghost_info(&mut self) {
        self.host.clear();
    }

    /// Releases every ghost received from the peer
    pub fn delete_local_ghosts(&mut self) {
        self.local_ghosts.clear(self.key);
    }
}

impl PacketNotifiable for GhostConnection {
    fn notify_packet_delivered(&mut self, packet_index: PacketIndex) {
        self.host.notify_packet_delivered(packet_index);
    }

    fn notify_packet_dropped(&mut self, packet_index: PacketIndex) {
        self.host.notify_packet_dropped(packet_index);
    }
}

impl Drop for GhostConnection {
    fn drop(&mut self) {
        self.clear_ghost_info();
        self.delete_local_ghosts();
    }
}
