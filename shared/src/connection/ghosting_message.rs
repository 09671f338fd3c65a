use ghostwire_serde::{BitReader, BitWrite, ConstBitLength, Serde, SerdeErr, UnsignedInteger};

/// Control messages that start and stop a ghosting session. They must be
/// carried on a reliable ordered channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GhostingMessage {
    /// Host to receiver: a new session begins
    StartGhosting { sequence: u32 },
    /// Receiver to host: ready for ghost packets of session `sequence`
    ReadyForNormalGhosts { sequence: u32 },
    /// Host to receiver: the session ended, release every ghost
    EndGhosting,
}

impl Serde for GhostingMessage {
    fn ser(&self, writer: &mut dyn BitWrite) {
        match self {
            GhostingMessage::StartGhosting { sequence } => {
                UnsignedInteger::<2>::new(0u8).ser(writer);
                sequence.ser(writer);
            }
            GhostingMessage::ReadyForNormalGhosts { sequence } => {
                UnsignedInteger::<2>::new(1u8).ser(writer);
                sequence.ser(writer);
            }
            GhostingMessage::EndGhosting => {
                UnsignedInteger::<2>::new(2u8).ser(writer);
            }
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let tag = UnsignedInteger::<2>::de(reader)?.get();
        match tag {
            0 => Ok(GhostingMessage::StartGhosting {
                sequence: u32::de(reader)?,
            }),
            1 => Ok(GhostingMessage::ReadyForNormalGhosts {
                sequence: u32::de(reader)?,
            }),
            2 => Ok(GhostingMessage::EndGhosting),
            value => Err(SerdeErr::ValueOutOfRange { value, bits: 2 }),
        }
    }

    fn bit_length(&self) -> u32 {
        let tag = <UnsignedInteger<2> as ConstBitLength>::const_bit_length();
        match self {
            GhostingMessage::EndGhosting => tag,
            _ => tag + <u32 as ConstBitLength>::const_bit_length(),
        }
    }
}
