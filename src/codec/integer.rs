use crate::bits::{BitReader, BitWriter};
use crate::context::Context;
use crate::error::Result;
use crate::eval;
use crate::template::Descriptor;
use crate::value::Value;

use super::{Codec, Env};

/// Sizes 1..=64 read/write as a 64-bit integer; wider sizes round-trip
/// through an arbitrary-precision one. The size expression is resolved
/// fresh against `#self` on every call, since later fields may size
/// themselves off earlier ones (spec §4.4 "Integer codec").
#[derive(Debug)]
pub struct IntegerCodec;

impl Codec for IntegerCodec {
    fn decode(&self, reader: &mut BitReader, descriptor: &Descriptor, ctx: &mut Context, _env: &Env<'_>) -> Result<Value> {
        let Descriptor::Integer { bit_size_expr, byte_order, signedness } = descriptor else {
            unreachable!("integer codec dispatched on non-integer descriptor")
        };
        let n = eval::eval_str(bit_size_expr, ctx)?.as_u64()?;
        reader.read_int(n, *byte_order, *signedness)
    }

    fn encode(
        &self,
        writer: &mut BitWriter,
        descriptor: &Descriptor,
        ctx: &mut Context,
        value: &Value,
        _env: &Env<'_>,
    ) -> Result<()> {
        let Descriptor::Integer { bit_size_expr, byte_order, signedness } = descriptor else {
            unreachable!("integer codec dispatched on non-integer descriptor")
        };
        let n = eval::eval_str(bit_size_expr, ctx)?.as_u64()?;
        writer.write_int(value, n, *byte_order, *signedness)
    }
}
