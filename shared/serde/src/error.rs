use thiserror::Error;

/// Errors raised while encoding or decoding bit-packed values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// The reader ran out of bits. Usually a truncated or desynchronized packet
    #[error("Attempted to read past the end of the buffer at bit {position} of {length}")]
    EndOfBuffer { position: u32, length: u32 },

    /// A value does not fit into the bit width it is serialized with
    #[error("Value {value} cannot be encoded in {bits} bits")]
    ValueOutOfRange { value: u64, bits: u8 },

    /// Requested a single read wider than 64 bits
    #[error("Cannot read {bits} bits into a 64-bit integer")]
    BitWidthTooLarge { bits: u8 },
}
