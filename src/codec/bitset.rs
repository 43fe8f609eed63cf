use crate::bits::{BitReader, BitWriter};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::eval;
use crate::template::Descriptor;
use crate::value::Value;

use super::{Codec, Env};

/// Reads/writes a raw bit-sequence of the declared size. Big-endian
/// storage reverses the sequence on read (and the reverse on write, to
/// round-trip) — spec §4.4 "BitSet codec".
#[derive(Debug)]
pub struct BitSetCodec;

impl Codec for BitSetCodec {
    fn decode(&self, reader: &mut BitReader, descriptor: &Descriptor, ctx: &mut Context, _env: &Env<'_>) -> Result<Value> {
        let Descriptor::BitSet { bit_size_expr, byte_order } = descriptor else {
            unreachable!("bitset codec dispatched on non-bitset descriptor")
        };
        let n = eval::eval_str(bit_size_expr, ctx)?.as_u64()?;
        let mut raw = reader.read_bits(n)?;
        if matches!(byte_order, crate::bits::ByteOrder::Big) {
            raw.bits.reverse();
        }
        Ok(Value::Bits(raw))
    }

    fn encode(
        &self,
        writer: &mut BitWriter,
        descriptor: &Descriptor,
        _ctx: &mut Context,
        value: &Value,
        _env: &Env<'_>,
    ) -> Result<()> {
        let Descriptor::BitSet { byte_order, .. } = descriptor else {
            unreachable!("bitset codec dispatched on non-bitset descriptor")
        };
        let Value::Bits(bits) = value else {
            return Err(Error::Expression {
                expression: "<value>".into(),
                message: format!("expected bitset, got {value:?}"),
            });
        };
        let mut out = bits.clone();
        if matches!(byte_order, crate::bits::ByteOrder::Big) {
            out.bits.reverse();
        }
        writer.write_bits(&out);
        Ok(())
    }
}
