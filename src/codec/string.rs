use regex::Regex;

use crate::bits::{BitReader, BitWriter};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::eval;
use crate::template::Descriptor;
use crate::value::Value;

use super::{Codec, Env};

/// Decodes/encodes exactly `size(expr)` bytes with the given charset. A
/// `match` regex, if present, is checked on both directions (spec §4.4
/// "String codec").
#[derive(Debug)]
pub struct StringCodec;

impl Codec for StringCodec {
    fn decode(&self, reader: &mut BitReader, descriptor: &Descriptor, ctx: &mut Context, _env: &Env<'_>) -> Result<Value> {
        let Descriptor::String { byte_size_expr, charset, match_pattern } = descriptor else {
            unreachable!("string codec dispatched on non-string descriptor")
        };
        let n = eval::eval_str(byte_size_expr, ctx)?.as_u64()?;
        let text = reader.read_text_fixed(n, *charset)?;
        check_match(match_pattern, &text)?;
        Ok(Value::Str(text))
    }

    fn encode(
        &self,
        writer: &mut BitWriter,
        descriptor: &Descriptor,
        ctx: &mut Context,
        value: &Value,
        _env: &Env<'_>,
    ) -> Result<()> {
        let Descriptor::String { byte_size_expr, charset, match_pattern } = descriptor else {
            unreachable!("string codec dispatched on non-string descriptor")
        };
        let n = eval::eval_str(byte_size_expr, ctx)?.as_u64()?;
        let text = value.as_str()?;
        check_match(match_pattern, text)?;
        writer.write_text_fixed(text, n, *charset)
    }
}

fn check_match(pattern: &Option<String>, text: &str) -> Result<()> {
    let Some(pattern) = pattern else { return Ok(()) };
    let re = Regex::new(pattern).map_err(|e| Error::annotation("match", e.to_string()))?;
    if re.is_match(text) {
        Ok(())
    } else {
        Err(Error::Match {
            field: String::new(),
            pattern: pattern.clone(),
            value: text.to_string(),
        })
    }
}
