//! Pluggable byte-range checksum functions (spec §4.4 "Checksum codec",
//! §6 Checksum descriptor). Algorithms are looked up by name so templates
//! can name one declaratively (`"crc16/ccitt-false"`, `"sum8"`, ...).

mod crc16;
mod sum;

use crate::error::{Error, Result};

/// A byte-range checksum function. `start_value` seeds the accumulator
/// (its meaning is algorithm-specific: an initial CRC register, or an
/// initial running sum).
pub trait ChecksumAlgorithm {
    fn compute(&self, bytes: &[u8], start_value: u64) -> u64;
}

/// Resolves a checksum algorithm by its declared name. Unknown names are
/// reported as a [`Error::Codec`], mirroring unknown descriptor kinds.
pub fn resolve(name: &str) -> Result<Box<dyn ChecksumAlgorithm>> {
    match name {
        "crc16/ccitt-false" => Ok(Box::new(crc16::Crc16::CcittFalse)),
        "crc16/xmodem" => Ok(Box::new(crc16::Crc16::Xmodem)),
        "crc16/modbus" => Ok(Box::new(crc16::Crc16::Modbus)),
        "sum8" => Ok(Box::new(sum::ByteSum)),
        other => Err(Error::Codec(format!("checksum `{other}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_algorithm_is_a_codec_error() {
        let err = resolve("crc99/bogus").unwrap_err();
        assert!(matches!(err, Error::Codec(_)));
    }

    #[test]
    fn all_known_names_resolve() {
        for name in ["crc16/ccitt-false", "crc16/xmodem", "crc16/modbus", "sum8"] {
            assert!(resolve(name).is_ok(), "{name} should resolve");
        }
    }
}
