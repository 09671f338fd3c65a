use crate::constants::MTU_SIZE_BITS;

pub trait BitWrite {
    fn write_bit(&mut self, bit: bool);

    /// Writes the low `bits` bits of `value`, least significant bit first
    fn write_bits(&mut self, value: u64, bits: u8) {
        let mut temp = value;
        for _ in 0..bits {
            self.write_bit(temp & 1 != 0);
            temp >>= 1;
        }
    }

    fn write_byte(&mut self, byte: u8) {
        self.write_bits(byte as u64, 8);
    }
}

/// A growable bit buffer with a soft size budget.
///
/// Writing past the budget is allowed; callers check [`BitWriter::overflowed`]
/// and rewind with [`BitWriter::set_bit_position`] when the last write must be
/// undone.
pub struct BitWriter {
    buffer: Vec<u8>,
    bit_position: u32,
    max_bits: u32,
    reserved_bits: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::with_max_bits(MTU_SIZE_BITS)
    }

    pub fn with_max_bits(max_bits: u32) -> Self {
        Self {
            buffer: Vec::with_capacity(((max_bits + 7) / 8) as usize),
            bit_position: 0,
            max_bits,
            reserved_bits: 0,
        }
    }

    pub fn bit_position(&self) -> u32 {
        self.bit_position
    }

    /// Moves the write cursor. Moving backwards discards everything written
    /// after `position` once the buffer is finalized.
    pub fn set_bit_position(&mut self, position: u32) {
        self.bit_position = position;
    }

    /// Skips `bits` bits, leaving zeros to be patched with [`BitWriter::write_bits_at`]
    pub fn advance_bit_position(&mut self, bits: u32) {
        for _ in 0..bits {
            self.write_bit(false);
        }
    }

    /// Overwrites `bits` bits at `position` without moving the cursor
    pub fn write_bits_at(&mut self, value: u64, bits: u8, position: u32) {
        let saved = self.bit_position;
        self.bit_position = position;
        self.write_bits(value, bits);
        self.bit_position = saved.max(self.bit_position);
    }

    /// Bits available before the budget is reached, excluding reserved bits
    pub fn bits_free(&self) -> u32 {
        self.budget().saturating_sub(self.bit_position)
    }

    pub fn is_full(&self) -> bool {
        self.bit_position >= self.budget()
    }

    pub fn overflowed(&self) -> bool {
        self.bit_position > self.budget()
    }

    /// Holds back `bits` from the budget, e.g. for a terminator written later
    pub fn reserve_bits(&mut self, bits: u32) {
        self.reserved_bits += bits;
    }

    pub fn release_bits(&mut self, bits: u32) {
        self.reserved_bits = self.reserved_bits.saturating_sub(bits);
    }

    pub fn to_bytes(mut self) -> Vec<u8> {
        let byte_length = ((self.bit_position + 7) / 8) as usize;
        self.buffer.resize(byte_length, 0);
        let tail_bits = self.bit_position % 8;
        if tail_bits != 0 {
            if let Some(last) = self.buffer.last_mut() {
                *last &= (1u8 << tail_bits) - 1;
            }
        }
        self.buffer
    }

    fn budget(&self) -> u32 {
        self.max_bits.saturating_sub(self.reserved_bits)
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BitWrite for BitWriter {
    fn write_bit(&mut self, bit: bool) {
        let byte_index = (self.bit_position / 8) as usize;
        if byte_index >= self.buffer.len() {
            self.buffer.resize(byte_index + 1, 0);
        }
        let mask = 1u8 << (self.bit_position % 8);
        if bit {
            self.buffer[byte_index] |= mask;
        } else {
            self.buffer[byte_index] &= !mask;
        }
        self.bit_position += 1;
    }
}

/// Counts bits without storing them
pub struct BitCounter {
    bits: u32,
}

impl BitCounter {
    pub fn new() -> Self {
        Self { bits: 0 }
    }

    pub fn bits_needed(&self) -> u32 {
        self.bits
    }
}

impl Default for BitCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl BitWrite for BitCounter {
    fn write_bit(&mut self, _bit: bool) {
        self.bits += 1;
    }

    fn write_bits(&mut self, _value: u64, bits: u8) {
        self.bits += bits as u32;
    }
}
