use num_bigint::{BigInt, BigUint, Sign};

use crate::charset::Charset;
use crate::error::Result;
use crate::value::{BitSet, Value};

use super::buffer::BitBuffer;
use super::order::{ByteOrder, Signedness};

/// Typed facade over [`BitBuffer`] for encode operations. Mirrors every
/// `BitReader::read_*` with a `write_*` such that writing then reading the
/// same operations reproduces the original values bit-for-bit (spec §4.1
/// round-trip property).
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    buffer: BitBuffer,
}

impl BitWriter {
    pub fn new() -> Self {
        Self { buffer: BitBuffer::empty() }
    }

    pub fn bit_position(&self) -> u64 {
        self.buffer.bit_position()
    }

    pub fn byte_position(&self) -> u64 {
        self.buffer.byte_position()
    }

    /// Rolls the buffer back to `position`, discarding anything written
    /// after it. Never leaves a partially-flushed byte dangling (spec §5).
    pub fn reset_to(&mut self, position: u64) {
        self.buffer.truncate_to(position);
    }

    pub fn write_bits(&mut self, bits: &BitSet) {
        self.buffer.write_bits(&bits.bits);
    }

    pub fn write_int(&mut self, value: &Value, n: u64, order: ByteOrder, sign: Signedness) -> Result<()> {
        if n == 0 {
            return Ok(());
        }
        let big_endian_fill = matches!(order, ByteOrder::Big);
        let byte_aligned = n % 8 == 0;

        let magnitude: BigUint = match value {
            Value::Int(v) => BigUint::from((*v as u64) & mask_u64(n)),
            Value::BigInt(b) => match sign {
                Signedness::Signed => to_twos_complement(b, n),
                Signedness::Unsigned => b.to_biguint().unwrap_or_default(),
            },
            other => {
                return Err(crate::error::Error::Expression {
                    expression: "<value>".into(),
                    message: format!("expected integer to encode, got {other:?}"),
                })
            }
        };

        let bits = if byte_aligned && !big_endian_fill {
            let mut bytes = magnitude.to_bytes_be();
            pad_be(&mut bytes, (n / 8) as usize);
            bytes.reverse();
            bytes_to_bits(&bytes)
        } else if big_endian_fill {
            let mut bytes = magnitude.to_bytes_be();
            pad_be(&mut bytes, ((n + 7) / 8) as usize);
            bytes_to_bits(&bytes)[(bytes.len() * 8 - n as usize)..].to_vec()
        } else {
            // sub-byte little-endian: LSB filled first, mirroring BitReader.
            (0..n)
                .map(|i| (&magnitude >> i) & BigUint::from(1u8) == BigUint::from(1u8))
                .collect()
        };

        self.buffer.write_bits(&bits);
        Ok(())
    }

    pub fn write_text_fixed(&mut self, text: &str, n_bytes: u64, charset: Charset) -> Result<()> {
        let mut bytes = charset.encode(text)?;
        bytes.resize(n_bytes as usize, 0);
        self.buffer.write_bits(&bytes_to_bits(&bytes));
        Ok(())
    }

    /// Writes `text` followed by `terminator`. Per the open question in
    /// spec §9(a), the terminator is always written on encode even when
    /// `consume_terminator` was false on decode.
    pub fn write_text_terminated(&mut self, text: &str, terminator: u8, charset: Charset) -> Result<()> {
        let bytes = charset.encode(text)?;
        self.buffer.write_bits(&bytes_to_bits(&bytes));
        self.buffer.write_bits(&bytes_to_bits(&[terminator]));
        Ok(())
    }

    pub fn write_checksum_placeholder(&mut self, bit_size: u32) {
        self.buffer.write_bits(&vec![false; bit_size as usize]);
    }

    pub fn patch_checksum(&mut self, bit_position: u64, bit_size: u32, value: u64) {
        let saved = self.buffer.bit_position();
        self.buffer.set_bit_position(bit_position);
        let bytes_len = (bit_size as usize + 7) / 8;
        let mut bytes = value.to_be_bytes().to_vec();
        let start = bytes.len() - bytes_len;
        self.buffer.write_bits(&bytes_to_bits(&bytes[start..]));
        self.buffer.set_bit_position(saved);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.into_bytes()
    }

    pub fn bytes(&self) -> &[u8] {
        self.buffer.bytes()
    }
}

fn mask_u64(n: u64) -> u64 {
    if n >= 64 {
        u64::MAX
    } else {
        (1u64 << n) - 1
    }
}

fn pad_be(bytes: &mut Vec<u8>, target_len: usize) {
    if bytes.len() < target_len {
        let mut padded = vec![0u8; target_len - bytes.len()];
        padded.extend_from_slice(bytes);
        *bytes = padded;
    }
}

fn bytes_to_bits(bytes: &[u8]) -> Vec<bool> {
    bytes
        .iter()
        .flat_map(|&b| (0..8).rev().map(move |i| (b >> i) & 1 == 1))
        .collect()
}

/// Converts a signed `BigInt` into its `n`-bit two's-complement magnitude.
fn to_twos_complement(value: &BigInt, n: u64) -> BigUint {
    if value.sign() == Sign::Minus {
        let modulus = BigInt::from(1u8) << n;
        let wrapped = value + modulus;
        wrapped.to_biguint().unwrap_or_default()
    } else {
        let (_, mag) = value.clone().into_parts();
        mag
    }
}
