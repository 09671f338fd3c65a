use log::{debug, warn};

use ghostwire_serde::{BitReader, Serde};

use crate::{
    constants::{
        GHOST_ID_BIT_OFFSET, GHOST_ID_BIT_SIZE, MAX_GHOST_ID_BITS, OBJECT_SIZE_BIT_SIZE,
    },
    types::{ClassId, ConnectionKey, GhostIndex},
    world::{
        object::{
            class_kinds::{class_bit_size, ClassKinds},
            ghost::GhostContext,
        },
        remote::{error::GhostReadError, local_ghosts::LocalGhosts},
    },
};

pub struct RemoteGhostReader;

impl RemoteGhostReader {
    /// Reads ghost records until the terminator bit, creating, updating and
    /// removing local ghosts. Stops at the first error; the stream cannot be
    /// resumed after one.
    pub fn read_updates(
        ghosts: &mut LocalGhosts,
        class_kinds: &ClassKinds,
        class_count: u32,
        connection: ConnectionKey,
        debug_object_sizes: bool,
        reader: &mut BitReader,
    ) -> Result<(), GhostReadError> {
        let class_bits = class_bit_size(class_count);
        let mut index_bits: Option<u8> = None;

        loop {
            // read ghost continue bit
            let ghost_continue = bool::de(reader)?;
            if !ghost_continue {
                break;
            }

            let bits = match index_bits {
                Some(bits) => bits,
                None => {
                    let bits = reader.read_bits(GHOST_ID_BIT_SIZE)? as u8 + GHOST_ID_BIT_OFFSET;
                    if bits > MAX_GHOST_ID_BITS {
                        return Err(GhostReadError::IndexWidthOutOfRange {
                            bits,
                            max: MAX_GHOST_ID_BITS,
                        });
                    }
                    index_bits = Some(bits);
                    bits
                }
            };
            let index = reader.read_bits(bits)? as GhostIndex;

            let is_removal = bool::de(reader)?;
            if is_removal {
                Self::remove_ghost(ghosts, connection, index);
                continue;
            }

            let end_position = if debug_object_sizes {
                Some(reader.read_bits(OBJECT_SIZE_BIT_SIZE)? as u32)
            } else {
                None
            };

            let is_initial = bool::de(reader)?;
            if is_initial {
                let class_id = reader.read_bits(class_bits)? as ClassId;
                if class_id >= class_count {
                    return Err(GhostReadError::InvalidClassId {
                        class_id,
                        class_count,
                    });
                }
                let Some(mut ghost) = class_kinds.build(class_id) else {
                    return Err(GhostReadError::ClassNotRegistered { class_id });
                };
                if ghosts.is_live(index) {
                    debug!("ghost {index} created again without removal, replacing it");
                    Self::remove_ghost(ghosts, connection, index);
                }

                let context = GhostContext::new(connection, index, ghosts);
                ghost.on_ghost_add_before_update(&context);
                ghost.unpack_update(&context, reader, true)?;
                Self::check_end_position(index, end_position, reader)?;
                if !ghost.on_ghost_add(&context) {
                    return Err(GhostReadError::GhostAddRejected { index, class_id });
                }
                ghosts.put(index, ghost);
            } else {
                let Some(mut ghost) = ghosts.take(index) else {
                    warn!("update for ghost {index}, which was never created");
                    return Err(GhostReadError::UpdateForUnknownGhost { index });
                };
                let context = GhostContext::new(connection, index, ghosts);
                let result = ghost
                    .unpack_update(&context, reader, false)
                    .map_err(GhostReadError::from)
                    .and_then(|_| Self::check_end_position(index, end_position, reader));
                ghosts.put(index, ghost);
                result?;
            }
        }

        Ok(())
    }

    fn remove_ghost(ghosts: &mut LocalGhosts, connection: ConnectionKey, index: GhostIndex) {
        let Some(mut ghost) = ghosts.take(index) else {
            debug!("removal for ghost {index}, which is not live, ignoring");
            return;
        };
        let context = GhostContext::new(connection, index, ghosts);
        ghost.on_ghost_remove(&context);
    }

    fn check_end_position(
        index: GhostIndex,
        end_position: Option<u32>,
        reader: &BitReader,
    ) -> Result<(), GhostReadError> {
        let Some(expected) = end_position else {
            return Ok(());
        };
        let actual = reader.bit_position();
        if actual != expected {
            return Err(GhostReadError::ObjectSizeMismatch {
                index,
                expected,
                actual,
            });
        }
        Ok(())
    }
}
