use crate::{bit_reader::BitReader, bit_writer::BitWrite, error::SerdeErr};

/// A type that can be bit-packed into a packet and read back
pub trait Serde: Sized + Clone + PartialEq {
    fn ser(&self, writer: &mut dyn BitWrite);

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr>;

    fn bit_length(&self) -> u32;
}

pub trait ConstBitLength {
    fn const_bit_length() -> u32;
}

impl Serde for bool {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_bit(*self);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        reader.read_bit()
    }

    fn bit_length(&self) -> u32 {
        1
    }
}

impl ConstBitLength for bool {
    fn const_bit_length() -> u32 {
        1
    }
}

macro_rules! impl_serde_for_unsigned {
    ($($ty:ty),*) => {
        $(
            impl Serde for $ty {
                fn ser(&self, writer: &mut dyn BitWrite) {
                    writer.write_bits(*self as u64, <$ty>::BITS as u8);
                }

                fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
                    Ok(reader.read_bits(<$ty>::BITS as u8)? as $ty)
                }

                fn bit_length(&self) -> u32 {
                    <$ty>::BITS
                }
            }

            impl ConstBitLength for $ty {
                fn const_bit_length() -> u32 {
                    <$ty>::BITS
                }
            }
        )*
    };
}

impl_serde_for_unsigned!(u8, u16, u32, u64);

macro_rules! impl_serde_for_signed {
    ($($ty:ty => $unsigned:ty),*) => {
        $(
            impl Serde for $ty {
                fn ser(&self, writer: &mut dyn BitWrite) {
                    (*self as $unsigned).ser(writer);
                }

                fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
                    Ok(<$unsigned>::de(reader)? as $ty)
                }

                fn bit_length(&self) -> u32 {
                    <$ty>::BITS
                }
            }

            impl ConstBitLength for $ty {
                fn const_bit_length() -> u32 {
                    <$ty>::BITS
                }
            }
        )*
    };
}

impl_serde_for_signed!(i8 => u8, i16 => u16, i32 => u32, i64 => u64);

impl Serde for f32 {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.to_bits().ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(f32::from_bits(u32::de(reader)?))
    }

    fn bit_length(&self) -> u32 {
        32
    }
}

impl ConstBitLength for f32 {
    fn const_bit_length() -> u32 {
        32
    }
}

impl<T: Serde> Serde for Option<T> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        match self {
            Some(value) => {
                writer.write_bit(true);
                value.ser(writer);
            }
            None => writer.write_bit(false),
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        if reader.read_bit()? {
            Ok(Some(T::de(reader)?))
        } else {
            Ok(None)
        }
    }

    fn bit_length(&self) -> u32 {
        1 + self.as_ref().map_or(0, |value| value.bit_length())
    }
}
