use crate::bits::{BitReader, BitWriter};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::eval;
use crate::template::Descriptor;
use crate::value::Value;

use super::{Codec, Env};

/// A flat array of fixed-width primitives, skipping the per-element
/// codec dispatch an `Array` of objects needs (spec §6 "AsArray
/// wrapper").
#[derive(Debug)]
pub struct ArrayPrimitiveCodec;

impl Codec for ArrayPrimitiveCodec {
    fn decode(&self, reader: &mut BitReader, descriptor: &Descriptor, ctx: &mut Context, _env: &Env<'_>) -> Result<Value> {
        let Descriptor::ArrayPrimitive { element_kind, length_expr, byte_order } = descriptor else {
            unreachable!("array_primitive codec dispatched on wrong descriptor")
        };
        let length = eval::eval_str(length_expr, ctx)?.as_u64()?;
        let mut items = Vec::with_capacity(length as usize);
        for _ in 0..length {
            items.push(reader.read_int(element_kind.bits(), *byte_order, element_kind.signedness())?);
        }
        Ok(Value::Array(items))
    }

    fn encode(
        &self,
        writer: &mut BitWriter,
        descriptor: &Descriptor,
        _ctx: &mut Context,
        value: &Value,
        _env: &Env<'_>,
    ) -> Result<()> {
        let Descriptor::ArrayPrimitive { element_kind, byte_order, .. } = descriptor else {
            unreachable!("array_primitive codec dispatched on wrong descriptor")
        };
        let Value::Array(items) = value else {
            return Err(Error::Expression {
                expression: "<value>".into(),
                message: format!("expected array, got {value:?}"),
            });
        };
        for item in items {
            writer.write_int(item, element_kind.bits(), *byte_order, element_kind.signedness())?;
        }
        Ok(())
    }
}
