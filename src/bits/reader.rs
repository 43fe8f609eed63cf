use num_bigint::{BigInt, BigUint};

use crate::charset::Charset;
use crate::error::Result;
use crate::value::{BitSet, Value};

use super::buffer::BitBuffer;
use super::order::{ByteOrder, Signedness};

/// Typed facade over [`BitBuffer`] for decode operations (spec §4.1).
#[derive(Debug, Clone)]
pub struct BitReader {
    buffer: BitBuffer,
}

impl BitReader {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { buffer: BitBuffer::from_bytes(bytes) }
    }

    pub fn bit_position(&self) -> u64 {
        self.buffer.bit_position()
    }

    pub fn set_bit_position(&mut self, pos: u64) {
        self.buffer.set_bit_position(pos);
    }

    pub fn byte_position(&self) -> u64 {
        self.buffer.byte_position()
    }

    pub fn remaining_bits(&self) -> u64 {
        self.buffer.remaining_bits()
    }

    pub fn is_exhausted(&self) -> bool {
        self.buffer.remaining_bits() == 0
    }

    pub fn bytes(&self) -> &[u8] {
        self.buffer.bytes()
    }

    pub fn read_bits(&mut self, n: u64) -> Result<BitSet> {
        let raw = self.buffer.read_bits(n)?;
        Ok(BitSet::new(raw))
    }

    pub fn peek_bytes(&self, n: u64) -> Option<Vec<u8>> {
        self.buffer.peek_bits(n * 8).ok().map(|bits| pack_msb(&bits))
    }

    /// Reads an `n`-bit integer honoring endianness and sign-extension
    /// (spec §4.1). `n <= 64` returns [`Value::Int`]; wider widths return
    /// [`Value::BigInt`].
    pub fn read_int(&mut self, n: u64, order: ByteOrder, sign: Signedness) -> Result<Value> {
        if n == 0 {
            return Ok(Value::Int(0));
        }
        let raw = self.buffer.read_bits(n)?;
        let big_endian_fill = matches!(order, ByteOrder::Big);
        let magnitude = assemble_unsigned(&raw, big_endian_fill, n % 8 == 0);

        if n <= 64 {
            let mut v: u64 = magnitude.iter_u64_digits().next().unwrap_or(0);
            if matches!(sign, Signedness::Signed) && n < 64 && (v >> (n - 1)) & 1 == 1 {
                v |= u64::MAX << n;
            }
            Ok(Value::Int(v as i64))
        } else {
            let mut signed = BigInt::from(magnitude.clone());
            if matches!(sign, Signedness::Signed) {
                let top_bit_index = n - 1;
                if bit_of_biguint(&magnitude, top_bit_index) {
                    signed -= BigInt::from(1u8) << n;
                }
            }
            Ok(Value::BigInt(signed))
        }
    }

    pub fn read_text_fixed(&mut self, n_bytes: u64, charset: Charset) -> Result<String> {
        let raw = self.buffer.read_bits(n_bytes * 8)?;
        let bytes = pack_msb(&raw);
        charset.decode(&bytes)
    }

    /// Scans forward for `terminator`; returns the bytes before it. If
    /// `consume` is true, advances the cursor past the terminator;
    /// otherwise the cursor is left sitting on it (spec §4.1).
    pub fn read_text_terminated(
        &mut self,
        terminator: u8,
        consume: bool,
        charset: Charset,
    ) -> Result<String> {
        let mut collected = Vec::new();
        loop {
            let start = self.buffer.bit_position();
            let bits = self.buffer.read_bits(8)?;
            let byte = pack_msb(&bits)[0];
            if byte == terminator {
                if !consume {
                    self.buffer.set_bit_position(start);
                }
                return charset.decode(&collected);
            }
            collected.push(byte);
        }
    }

    pub fn read_checksum_raw(&mut self, bit_size: u32) -> Result<u64> {
        let raw = self.buffer.read_bits(bit_size as u64)?;
        Ok(pack_msb(&raw).iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
    }
}

fn assemble_unsigned(bits: &[bool], big_endian_fill: bool, byte_aligned: bool) -> BigUint {
    if big_endian_fill && byte_aligned {
        let bytes = pack_msb(bits);
        BigUint::from_bytes_be(&bytes)
    } else if big_endian_fill {
        // Sub-byte big-endian: the first bit read is the most significant;
        // `pack_msb`/`from_bytes_be` can't be used here since the trailing
        // partial group of `n % 8` bits would otherwise be weighted as a
        // full byte (256) instead of `2^(n % 8)`.
        let n = bits.len();
        let mut value = BigUint::from(0u8);
        for (i, &b) in bits.iter().enumerate() {
            if b {
                value |= BigUint::from(1u8) << (n - 1 - i);
            }
        }
        value
    } else if byte_aligned {
        // Byte-aligned little-endian: reverse byte order, keep each byte's
        // internal (MSB-first) bit order, matching the `0x001020` wire
        // example in spec §4.1.
        let bytes = pack_msb(bits);
        let reversed: Vec<u8> = bytes.into_iter().rev().collect();
        BigUint::from_bytes_be(&reversed)
    } else {
        // Sub-byte little-endian: fill from the LSB as each bit arrives.
        let mut value = BigUint::from(0u8);
        for (i, &b) in bits.iter().enumerate() {
            if b {
                value |= BigUint::from(1u8) << i;
            }
        }
        value
    }
}

fn bit_of_biguint(value: &BigUint, index: u64) -> bool {
    (value >> index) & BigUint::from(1u8) == BigUint::from(1u8)
}

/// Packs MSB-first physical bits into bytes (also MSB-first within each
/// byte). `bits.len()` must be a multiple of 8.
pub fn pack_msb(bits: &[bool]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | b as u8))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::writer::BitWriter;

    #[test]
    fn big_endian_unsigned_round_trips() {
        let mut writer = BitWriter::new();
        writer.write_int(&Value::Int(0xBEEF), 16, ByteOrder::Big, Signedness::Unsigned).unwrap();
        let bytes = writer.into_bytes();
        assert_eq!(bytes, vec![0xBE, 0xEF]);

        let mut reader = BitReader::new(bytes);
        assert_eq!(reader.read_int(16, ByteOrder::Big, Signedness::Unsigned).unwrap(), Value::Int(0xBEEF));
    }

    #[test]
    fn little_endian_byte_aligned_round_trips() {
        let mut writer = BitWriter::new();
        writer.write_int(&Value::Int(0x001020), 24, ByteOrder::Little, Signedness::Unsigned).unwrap();
        // spec §4.1's worked example: 0x001020 little-endian is stored as 20 10 00.
        assert_eq!(writer.bytes(), &[0x20, 0x10, 0x00]);

        let mut reader = BitReader::new(writer.into_bytes());
        assert_eq!(reader.read_int(24, ByteOrder::Little, Signedness::Unsigned).unwrap(), Value::Int(0x001020));
    }

    #[test]
    fn sub_byte_big_endian_unsigned_round_trips() {
        // A 12-bit big-endian field is explicitly legal (spec §4.5 item 3
        // "any bit width is legal"); the trailing 4-bit group must not be
        // mis-weighted as a full byte.
        let mut writer = BitWriter::new();
        writer.write_int(&Value::Int(0xABC), 12, ByteOrder::Big, Signedness::Unsigned).unwrap();
        let bytes = writer.into_bytes();

        let mut reader = BitReader::new(bytes);
        assert_eq!(reader.read_int(12, ByteOrder::Big, Signedness::Unsigned).unwrap(), Value::Int(0xABC));
    }

    #[test]
    fn sub_byte_signed_sign_extends_on_decode() {
        // -1 in 12 bits is 0xFFF; written little-endian (sub-byte, LSB-first fill).
        let mut writer = BitWriter::new();
        writer.write_int(&Value::Int(-1), 12, ByteOrder::Little, Signedness::Signed).unwrap();
        let bytes = writer.into_bytes();

        let mut reader = BitReader::new(bytes);
        assert_eq!(reader.read_int(12, ByteOrder::Little, Signedness::Signed).unwrap(), Value::Int(-1));
    }

    #[test]
    fn wider_than_64_bits_round_trips_as_bigint() {
        let value = BigInt::from(u64::MAX) * BigInt::from(4);
        let mut writer = BitWriter::new();
        writer.write_int(&Value::BigInt(value.clone()), 72, ByteOrder::Big, Signedness::Unsigned).unwrap();

        let mut reader = BitReader::new(writer.into_bytes());
        assert_eq!(reader.read_int(72, ByteOrder::Big, Signedness::Unsigned).unwrap(), Value::BigInt(value));
    }

    #[test]
    fn non_consuming_terminator_read_leaves_cursor_on_it() {
        let bytes = b"abc,xyz".to_vec();
        let mut reader = BitReader::new(bytes);

        let text = reader.read_text_terminated(b',', false, Charset::Ascii).unwrap();
        assert_eq!(text, "abc");
        // cursor sits right before the terminator byte, not past it.
        assert_eq!(reader.byte_position(), 3);

        let remaining = reader.read_text_fixed(4, Charset::Ascii).unwrap();
        assert_eq!(remaining, ",xyz");
    }
}
