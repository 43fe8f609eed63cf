use crate::bits::{ByteOrder, Signedness};
use crate::charset::Charset;

/// Wire-level primitive kinds usable inside an `ArrayPrimitive` descriptor
/// (spec §6 "AsArray wrapper"). Each carries a fixed bit width, unlike the
/// expression-sized `Integer` descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
}

impl PrimitiveKind {
    pub fn bits(self) -> u64 {
        match self {
            PrimitiveKind::U8 | PrimitiveKind::I8 => 8,
            PrimitiveKind::U16 | PrimitiveKind::I16 => 16,
            PrimitiveKind::U32 | PrimitiveKind::I32 => 32,
            PrimitiveKind::U64 | PrimitiveKind::I64 => 64,
        }
    }

    pub fn signedness(self) -> Signedness {
        match self {
            PrimitiveKind::I8 | PrimitiveKind::I16 | PrimitiveKind::I32 | PrimitiveKind::I64 => {
                Signedness::Signed
            }
            _ => Signedness::Unsigned,
        }
    }
}

/// One alternative of a [`Selector`]: `condition` is `None` for the
/// "default" entry, which matches iff no other alternative does.
#[derive(Debug, Clone)]
pub struct SelectorAlternative {
    pub condition_expr: Option<String>,
    pub target_type: String,
    /// The literal prefix value this alternative is written with on
    /// encode, when the selector reads a prefix. Required whenever
    /// `prefix_size_bits > 0` (see DESIGN.md's notes on selector
    /// round-tripping).
    pub prefix_value: Option<i64>,
}

/// Polymorphic subtype dispatch (spec §3 "Selector"). If
/// `prefix_size_bits > 0`, that many bits are read and bound as `#prefix`
/// before conditions are scanned; the first alternative whose condition
/// evaluates true wins, in source order.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    pub alternatives: Vec<SelectorAlternative>,
    pub prefix_size_bits: u64,
    pub prefix_byte_order: ByteOrder,
}

/// A before/after pair of expressions standing in for a user converter.
/// `decode_expr` is evaluated with the codec's raw output bound as
/// `#raw`; `encode_expr` is evaluated with the field's current value
/// bound as `#raw` and must produce the wire-shaped [`crate::value::Value`].
#[derive(Debug, Clone)]
pub struct Converter {
    pub decode_expr: String,
    pub encode_expr: String,
}

/// Tagged union of wire-field shapes (spec §3 "Descriptor variants").
#[derive(Debug, Clone)]
pub enum Descriptor {
    Integer {
        bit_size_expr: String,
        byte_order: ByteOrder,
        signedness: Signedness,
    },
    String {
        byte_size_expr: String,
        charset: Charset,
        match_pattern: Option<String>,
    },
    StringTerminated {
        terminator_byte: u8,
        consume_terminator: bool,
        charset: Charset,
    },
    Object {
        static_type: String,
        selector: Option<Selector>,
    },
    Array {
        element: Box<Descriptor>,
        length_expr: String,
        selector: Option<Selector>,
    },
    ArrayPrimitive {
        element_kind: PrimitiveKind,
        length_expr: String,
        byte_order: ByteOrder,
    },
    BitSet {
        bit_size_expr: String,
        byte_order: ByteOrder,
    },
    Checksum {
        algorithm: String,
        skip_start_bytes: u64,
        skip_end_bytes: u64,
        start_value: u64,
        result_bit_size: u32,
    },
}

impl Descriptor {
    /// The tag the Codec Registry dispatches on (spec §4.4 "exact-match
    /// on the descriptor's kind tag").
    pub fn kind(&self) -> &'static str {
        match self {
            Descriptor::Integer { .. } => "integer",
            Descriptor::String { .. } => "string",
            Descriptor::StringTerminated { .. } => "string_terminated",
            Descriptor::Object { .. } => "object",
            Descriptor::Array { .. } => "array",
            Descriptor::ArrayPrimitive { .. } => "array_primitive",
            Descriptor::BitSet { .. } => "bitset",
            Descriptor::Checksum { .. } => "checksum",
        }
    }
}
