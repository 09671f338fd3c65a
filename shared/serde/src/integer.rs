use crate::{
    bit_reader::BitReader, bit_writer::BitWrite, error::SerdeErr, serde::Serde, ConstBitLength,
};

/// Unsigned integer packed into exactly `BITS` bits
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct UnsignedInteger<const BITS: u8> {
    value: u64,
}

impl<const BITS: u8> UnsignedInteger<BITS> {
    /// # Panics
    ///
    /// Panics if `value` does not fit into `BITS` bits.
    pub fn new<T: Into<u64>>(value: T) -> Self {
        match Self::try_new(value) {
            Ok(integer) => integer,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn try_new<T: Into<u64>>(value: T) -> Result<Self, SerdeErr> {
        let value = value.into();
        if BITS < 64 && value >> BITS != 0 {
            return Err(SerdeErr::ValueOutOfRange { value, bits: BITS });
        }
        Ok(Self { value })
    }

    pub fn get(&self) -> u64 {
        self.value
    }
}

impl<const BITS: u8> Serde for UnsignedInteger<BITS> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_bits(self.value, BITS);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            value: reader.read_bits(BITS)?,
        })
    }

    fn bit_length(&self) -> u32 {
        BITS as u32
    }
}

impl<const BITS: u8> ConstBitLength for UnsignedInteger<BITS> {
    fn const_bit_length() -> u32 {
        BITS as u32
    }
}
