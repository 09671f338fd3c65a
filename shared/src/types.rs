pub type PacketIndex = u16;

/// Peer-visible per-connection ghost id, written on the wire in a
/// per-packet bit width
pub type GhostIndex = u32;

/// Position of a replicable class in the append-only class registry
pub type ClassId = u32;

/// Engine-wide identifier of a replicable object, assigned by the
/// `ObjectRegistry` that spawned it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    pub const fn to_u64(&self) -> u64 {
        self.0
    }
}

/// Identifies a connection inside an object's back-reference list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionKey(u64);

impl ConnectionKey {
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    pub const fn to_u64(&self) -> u64 {
        self.0
    }
}
