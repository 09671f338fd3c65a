use thiserror::Error;

use ghostwire_serde::SerdeErr;

use crate::types::{ClassId, GhostIndex};

/// Errors raised while reading the ghost section of a packet.
///
/// Every variant is fatal for the connection: once one is hit the bit stream
/// can no longer be interpreted, so the rest of the packet is abandoned and
/// the connection is marked for termination.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GhostReadError {
    /// Class id at or above the class count negotiated at connect
    #[error("Class id {class_id} is out of range, {class_count} classes were negotiated")]
    InvalidClassId { class_id: ClassId, class_count: u32 },

    /// Class id within the negotiated range but missing from the local registry
    #[error("Class id {class_id} has no registered ghost constructor")]
    ClassNotRegistered { class_id: ClassId },

    /// The ghost's add hook refused it
    #[error("Ghost {index} of class {class_id} was rejected by its add hook")]
    GhostAddRejected { index: GhostIndex, class_id: ClassId },

    /// Index width wider than any publish index a host can allocate
    #[error("Ghost index width of {bits} bits exceeds the maximum of {max}")]
    IndexWidthOutOfRange { bits: u8, max: u8 },

    /// A non-initial update named an index that holds no ghost
    #[error("Update for ghost {index}, which does not exist")]
    UpdateForUnknownGhost { index: GhostIndex },

    /// Unpacking consumed a different number of bits than packing wrote
    #[error("Ghost {index} unpack ended at bit {actual}, expected {expected}")]
    ObjectSizeMismatch {
        index: GhostIndex,
        expected: u32,
        actual: u32,
    },

    /// Packet did not start with the debug checksum
    #[error("Debug checksum mismatch: read {found:#010x}")]
    DebugChecksumMismatch { found: u32 },

    #[error(transparent)]
    Serde(#[from] SerdeErr),
}
