use crate::bits::{BitReader, BitWriter};
use crate::context::Context;
use crate::error::Result;
use crate::template::Descriptor;
use crate::value::Value;

use super::{Codec, Env};

/// A "late" codec: on decode it only reads the tail bits into a raw
/// integer: verification against the computed checksum happens once the
/// Template Parser knows the full decoded byte range (spec §4.4
/// "Checksum codec"). On encode it writes a zero placeholder that the
/// parser patches after the covered range is known.
#[derive(Debug)]
pub struct ChecksumCodec;

impl Codec for ChecksumCodec {
    fn decode(&self, reader: &mut BitReader, descriptor: &Descriptor, _ctx: &mut Context, _env: &Env<'_>) -> Result<Value> {
        let Descriptor::Checksum { result_bit_size, .. } = descriptor else {
            unreachable!("checksum codec dispatched on non-checksum descriptor")
        };
        let raw = reader.read_checksum_raw(*result_bit_size)?;
        Ok(Value::Int(raw as i64))
    }

    fn encode(
        &self,
        writer: &mut BitWriter,
        descriptor: &Descriptor,
        _ctx: &mut Context,
        _value: &Value,
        _env: &Env<'_>,
    ) -> Result<()> {
        let Descriptor::Checksum { result_bit_size, .. } = descriptor else {
            unreachable!("checksum codec dispatched on non-checksum descriptor")
        };
        writer.write_checksum_placeholder(*result_bit_size);
        Ok(())
    }
}
