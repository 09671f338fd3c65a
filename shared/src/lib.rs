//! # Ghostwire Shared
//! Ghost replication core: per-connection ghost tables, the priority packet
//! scheduler, the notify ledger that retires or restores dirty bits, and the
//! receiver that maintains a peer's shadow objects.

#![deny(unstable_features, unused_import_braces)]

pub use ghostwire_serde::{
    BitCounter, BitReader, BitWrite, BitWriter, ConstBitLength, Serde, SerdeErr,
    UnsignedInteger, MTU_SIZE_BITS, MTU_SIZE_BYTES,
};

mod connection;
mod constants;
pub mod handshake;
mod protocol;
mod types;
mod world;

pub use connection::{
    error::GhostingError, ghost_config::GhostConfig, ghost_connection::GhostConnection,
    ghosting_message::GhostingMessage, packet_notifiable::PacketNotifiable,
};
pub use constants::{
    CLASS_COUNT_BIT_SIZE, DEBUG_CHECKSUM, GHOST_EVICTION_MARGIN, GHOST_ID_BIT_OFFSET,
    GHOST_ID_BIT_SIZE, MAX_GHOST_COUNT, MAX_GHOST_ID_BITS, NEW_GHOST_PRIORITY_BOOST,
    OBJECT_SIZE_BIT_SIZE, REMOVAL_PRIORITY,
};
pub use handshake::{ClassCountHandshake, HandshakeError};
pub use protocol::{Protocol, ProtocolError, ProtocolPlugin, MAX_CLASS_COUNT};
pub use types::{ClassId, ConnectionKey, GhostIndex, ObjectId, PacketIndex};
pub use world::{
    host::{
        class_stats::{ClassStats, ClassUpdateStats},
        error::GhostTableError,
        ghost_record::{GhostFlags, GhostRecord},
        ghost_table::GhostTable,
        host_ghost_manager::HostGhostManager,
        host_ghost_writer::{index_bit_width, HostGhostWriter},
        scope::{ScopeProvider, ScopeQuery},
        update_ledger::{PendingKey, PendingUpdate, UpdateKind, UpdateLedger},
    },
    object::{
        class_kinds::{class_bit_size, ClassKinds, GhostBuilder},
        dirty_mask::DirtyMask,
        dirty_receiver::DirtyReceiver,
        ghost::{Ghost, GhostContext},
        net_object::{NetObjectHandle, ObjectRegistry, WeakNetObject},
        replicate::Replicate,
    },
    remote::{
        error::GhostReadError, local_ghosts::LocalGhosts, remote_ghost_reader::RemoteGhostReader,
    },
};
