use crate::bits::{BitReader, BitWriter};
use crate::context::Context;
use crate::error::Result;
use crate::template::Descriptor;
use crate::value::Value;

use super::{Codec, Env};

/// Consumes up to the terminator on decode; always writes the
/// terminator on encode, even when `consume_terminator` was false (spec
/// §4.4 "String-terminated codec", resolved per the open question in
/// SPEC_FULL.md).
#[derive(Debug)]
pub struct StringTerminatedCodec;

impl Codec for StringTerminatedCodec {
    fn decode(&self, reader: &mut BitReader, descriptor: &Descriptor, _ctx: &mut Context, _env: &Env<'_>) -> Result<Value> {
        let Descriptor::StringTerminated { terminator_byte, consume_terminator, charset } = descriptor else {
            unreachable!("string_terminated codec dispatched on wrong descriptor")
        };
        let text = reader.read_text_terminated(*terminator_byte, *consume_terminator, *charset)?;
        Ok(Value::Str(text))
    }

    fn encode(
        &self,
        writer: &mut BitWriter,
        descriptor: &Descriptor,
        _ctx: &mut Context,
        value: &Value,
        _env: &Env<'_>,
    ) -> Result<()> {
        let Descriptor::StringTerminated { terminator_byte, charset, .. } = descriptor else {
            unreachable!("string_terminated codec dispatched on wrong descriptor")
        };
        writer.write_text_terminated(value.as_str()?, *terminator_byte, *charset)
    }
}
