use crate::error::SerdeErr;

pub struct BitReader<'b> {
    buffer: &'b [u8],
    bit_position: u32,
    bit_length: u32,
}

impl<'b> BitReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self {
            buffer,
            bit_position: 0,
            bit_length: (buffer.len() as u32) * 8,
        }
    }

    pub fn bit_position(&self) -> u32 {
        self.bit_position
    }

    pub fn bits_remaining(&self) -> u32 {
        self.bit_length.saturating_sub(self.bit_position)
    }

    pub fn read_bit(&mut self) -> Result<bool, SerdeErr> {
        if self.bit_position >= self.bit_length {
            return Err(SerdeErr::EndOfBuffer {
                position: self.bit_position,
                length: self.bit_length,
            });
        }
        let byte = self.buffer[(self.bit_position / 8) as usize];
        let bit = byte & (1u8 << (self.bit_position % 8)) != 0;
        self.bit_position += 1;
        Ok(bit)
    }

    /// Reads `bits` bits written least significant bit first
    pub fn read_bits(&mut self, bits: u8) -> Result<u64, SerdeErr> {
        if bits > 64 {
            return Err(SerdeErr::BitWidthTooLarge { bits });
        }
        if self.bits_remaining() < bits as u32 {
            return Err(SerdeErr::EndOfBuffer {
                position: self.bit_position,
                length: self.bit_length,
            });
        }
        let mut output: u64 = 0;
        for offset in 0..bits {
            if self.read_bit()? {
                output |= 1u64 << offset;
            }
        }
        Ok(output)
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        Ok(self.read_bits(8)? as u8)
    }
}
