use thiserror::Error;

use crate::types::{GhostIndex, ObjectId};

/// Corruption detected in a ghost table's partition layout.
///
/// These are never produced by a correct table; `GhostTable::check_invariants`
/// reports them so tests and debug builds can pinpoint the broken record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GhostTableError {
    /// Partition bounds are not ordered `zero <= free <= len`
    #[error("Partition bounds out of order: zero update index {zero_update_index}, free index {free_index}, length {len}")]
    BoundsOutOfOrder {
        zero_update_index: usize,
        free_index: usize,
        len: usize,
    },

    /// More live records than the table allows
    #[error("Ghost table holds {live} live records, limit is {max}")]
    CapacityExceeded { live: usize, max: usize },

    /// A record's stored position disagrees with where it sits in the array
    #[error("Array slot {position} holds ghost {index} whose stored position disagrees")]
    IndexMismatch { position: usize, index: GhostIndex },

    /// A record in the dirty partition has an empty mask
    #[error("Ghost {index} sits in the dirty partition with an empty mask")]
    DirtyRecordClean { index: GhostIndex },

    /// A record in the clean partition has dirty bits
    #[error("Ghost {index} sits in the clean partition with dirty bits")]
    CleanRecordDirty { index: GhostIndex },

    /// A free slot still carries state from its previous object
    #[error("Free slot for ghost {index} still carries state")]
    FreeRecordInUse { index: GhostIndex },

    /// The object lookup points at a record that does not belong to the object
    #[error("Lookup maps object {object_id:?} to ghost {index} which is not linked to it")]
    LookupMismatch { object_id: ObjectId, index: GhostIndex },
}
