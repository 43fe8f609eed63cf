/// Byte order for multi-byte and sub-byte integer fields (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Big,
    Little,
}

impl Default for ByteOrder {
    fn default() -> Self {
        ByteOrder::Big
    }
}

/// Whether an `Integer` descriptor sign-extends its top bit on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signedness {
    Signed,
    Unsigned,
}

impl Default for Signedness {
    fn default() -> Self {
        Signedness::Unsigned
    }
}
