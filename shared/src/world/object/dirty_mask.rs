use std::{
    fmt,
    ops::{BitAnd, BitOr, BitOrAssign, Not},
};

use ghostwire_serde::{BitReader, BitWrite, ConstBitLength, Serde, SerdeErr};

/// 32-bit set of changed fields. Each replicable type decides what the bits
/// mean; replication only ever ORs, subtracts and tests them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DirtyMask(u32);

impl DirtyMask {
    pub const EMPTY: Self = Self(0);
    pub const ALL: Self = Self(u32::MAX);

    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn is_clear(&self) -> bool {
        self.0 == 0
    }

    pub fn bit(&self, index: u8) -> bool {
        index < 32 && self.0 & (1 << index) != 0
    }

    pub fn set_bit(&mut self, index: u8, value: bool) {
        if index >= 32 {
            return;
        }
        if value {
            self.0 |= 1 << index;
        } else {
            self.0 &= !(1 << index);
        }
    }

    pub fn or(&mut self, other: DirtyMask) {
        self.0 |= other.0;
    }

    /// Removes every bit set in `other`
    pub fn nand(&mut self, other: DirtyMask) {
        self.0 &= !other.0;
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub const fn is_subset_of(&self, other: DirtyMask) -> bool {
        self.0 & !other.0 == 0
    }

    pub const fn contains(&self, other: DirtyMask) -> bool {
        self.0 & other.0 == other.0
    }
}

impl fmt::Debug for DirtyMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DirtyMask({:#010x})", self.0)
    }
}

impl BitOr for DirtyMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DirtyMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for DirtyMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for DirtyMask {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl From<u32> for DirtyMask {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl Serde for DirtyMask {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.0.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self(u32::de(reader)?))
    }

    fn bit_length(&self) -> u32 {
        32
    }
}

impl ConstBitLength for DirtyMask {
    fn const_bit_length() -> u32 {
        32
    }
}
