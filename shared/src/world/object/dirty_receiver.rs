use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::world::object::dirty_mask::DirtyMask;

/// Per-connection inbox for dirty bits. The simulation ORs bits in from any
/// thread; the owning connection drains them when it prepares a packet.
#[derive(Debug, Default)]
pub struct DirtyReceiver {
    mask: AtomicU32,
    invalidated: AtomicBool,
}

impl DirtyReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self, mask: DirtyMask) {
        self.mask.fetch_or(mask.bits(), Ordering::AcqRel);
    }

    /// Returns and clears every bit marked since the last call
    pub fn take(&self) -> DirtyMask {
        DirtyMask::new(self.mask.swap(0, Ordering::AcqRel))
    }

    /// Signals that the object behind this receiver no longer exists
    pub fn invalidate(&self) {
        self.invalidated.store(true, Ordering::Release);
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::Acquire)
    }
}
