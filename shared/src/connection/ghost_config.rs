use std::default::Default;

use crate::constants::{MAX_GHOST_COUNT, NEW_GHOST_PRIORITY_BOOST, REMOVAL_PRIORITY};

/// Contains Config properties which will be used by every ghost connection
#[derive(Clone, Debug)]
pub struct GhostConfig {
    /// Maximum number of ghosts a connection may hold at once. Values above
    /// `MAX_GHOST_COUNT` are clamped.
    pub max_ghost_count: usize,
    /// Adds a checksum to every packet and the end position of every update,
    /// so the receiver can detect pack/unpack routines that disagree. Both
    /// peers must agree on this setting.
    pub debug_object_sizes: bool,
    /// Priority given to pending removals, ahead of any object priority
    pub removal_priority: f32,
    /// Added to the priority of objects whose creation was never sent
    pub new_ghost_priority_boost: f32,
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            max_ghost_count: MAX_GHOST_COUNT,
            debug_object_sizes: false,
            removal_priority: REMOVAL_PRIORITY,
            new_ghost_priority_boost: NEW_GHOST_PRIORITY_BOOST,
        }
    }
}
