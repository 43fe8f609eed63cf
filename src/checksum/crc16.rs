use super::ChecksumAlgorithm;

/// Named CRC-16 parameter sets, computed bit-by-bit (no table — the
/// buffers these run over are message-sized, not bulk data).
pub enum Crc16 {
    /// poly 0x1021, no reflection, table init replaced by `start_value`.
    CcittFalse,
    /// poly 0x1021, no reflection. Conventionally seeded with 0x0000.
    Xmodem,
    /// poly 0x8005, input and output reflected.
    Modbus,
}

struct Params {
    poly: u16,
    reflect: bool,
}

impl Crc16 {
    fn params(&self) -> Params {
        match self {
            Crc16::CcittFalse | Crc16::Xmodem => Params { poly: 0x1021, reflect: false },
            Crc16::Modbus => Params { poly: 0x8005, reflect: true },
        }
    }
}

impl ChecksumAlgorithm for Crc16 {
    fn compute(&self, bytes: &[u8], start_value: u64) -> u64 {
        let params = self.params();
        let mut reg = start_value as u16;
        for &byte in bytes {
            let b = if params.reflect { byte.reverse_bits() } else { byte };
            reg ^= (b as u16) << 8;
            for _ in 0..8 {
                if reg & 0x8000 != 0 {
                    reg = (reg << 1) ^ params.poly;
                } else {
                    reg <<= 1;
                }
            }
        }
        if params.reflect {
            reg.reverse_bits() as u64
        } else {
            reg as u64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ccitt_false_of_123456789() {
        let crc = Crc16::CcittFalse.compute(b"123456789", 0xFFFF);
        assert_eq!(crc, 0x29B1);
    }

    #[test]
    fn xmodem_of_123456789() {
        let crc = Crc16::Xmodem.compute(b"123456789", 0x0000);
        assert_eq!(crc, 0x31C3);
    }

    #[test]
    fn modbus_of_123456789() {
        let crc = Crc16::Modbus.compute(b"123456789", 0xFFFF);
        assert_eq!(crc, 0x4B37);
    }
}
