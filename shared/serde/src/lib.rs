//! # Ghostwire Serde
//! Bit-level writer/reader primitives for the ghost replication wire format.

mod bit_reader;
mod bit_writer;
mod constants;
mod error;
mod integer;
mod serde;

pub use bit_reader::BitReader;
pub use bit_writer::{BitCounter, BitWrite, BitWriter};
pub use constants::{MTU_SIZE_BITS, MTU_SIZE_BYTES};
pub use error::SerdeErr;
pub use integer::UnsignedInteger;
pub use serde::{ConstBitLength, Serde};
