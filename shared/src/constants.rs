/// Width of the field carrying the per-packet ghost index width
pub const GHOST_ID_BIT_SIZE: u8 = 5;
/// Minimum ghost index width; the width field stores `width - offset`
pub const GHOST_ID_BIT_OFFSET: u8 = 3;
/// Hard cap on live ghost records per connection
pub const MAX_GHOST_COUNT: usize = 1 << 15;
/// Once fewer free slots than this remain, clean out-of-scope ghosts are
/// evicted instead of waiting for their next change
pub const GHOST_EVICTION_MARGIN: usize = 10;
/// Widest ghost index the receiver accepts, enough for `MAX_GHOST_COUNT - 1`
pub const MAX_GHOST_ID_BITS: u8 = 15;

/// Written ahead of the ghost section when object size debugging is on
pub const DEBUG_CHECKSUM: u32 = 0xF00D_BAAD;
/// Width of the end-position field carried by each update in debug mode
pub const OBJECT_SIZE_BIT_SIZE: u8 = 16;

/// Width of the class count exchanged during the connect handshake
pub const CLASS_COUNT_BIT_SIZE: u8 = 16;

pub const REMOVAL_PRIORITY: f32 = 10000.0;
pub const NEW_GHOST_PRIORITY_BOOST: f32 = 1.0;
