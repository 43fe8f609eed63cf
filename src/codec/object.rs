use crate::bits::{BitReader, BitWriter, Signedness};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::eval;
use crate::template::{parser, Descriptor, Selector};
use crate::value::Value;

use super::{Codec, Env};

/// If a [`Selector`] is present, resolves the concrete subtype via the
/// spec §3 dispatch rule; otherwise uses the static type. Either way it
/// recursively invokes the Template Parser on the chosen subtype (spec
/// §4.4 "Object codec").
#[derive(Debug)]
pub struct ObjectCodec;

impl Codec for ObjectCodec {
    fn decode(&self, reader: &mut BitReader, descriptor: &Descriptor, ctx: &mut Context, env: &Env<'_>) -> Result<Value> {
        let Descriptor::Object { static_type, selector } = descriptor else {
            unreachable!("object codec dispatched on non-object descriptor")
        };

        let target_type = match selector {
            Some(selector) => select_decode(reader, selector, ctx)?,
            None => static_type.clone(),
        };

        let template = env
            .templates
            .get(&target_type)
            .ok_or_else(|| Error::Template(format!("no template registered for type `{target_type}`")))?;
        parser::decode(template, reader, ctx, env)
    }

    fn encode(
        &self,
        writer: &mut BitWriter,
        descriptor: &Descriptor,
        ctx: &mut Context,
        value: &Value,
        env: &Env<'_>,
    ) -> Result<()> {
        let Descriptor::Object { static_type: _, selector } = descriptor else {
            unreachable!("object codec dispatched on non-object descriptor")
        };
        let target_type = value.type_name().to_string();

        if let Some(selector) = selector {
            write_selector_prefix(writer, selector, &target_type)?;
        }

        let template = env
            .templates
            .get(&target_type)
            .ok_or_else(|| Error::Template(format!("no template registered for type `{target_type}`")))?;
        parser::encode(template, writer, ctx, value, env)
    }
}

/// Implements spec §3's Selector dispatch rule for decode: read the
/// prefix (if any) and bind it as `#prefix`, then take the first
/// alternative whose condition evaluates true; a condition-less entry
/// matches iff nothing else does. Shared with the Array codec, whose
/// per-element selector is resolved the same way (spec §4.4 "the
/// selector is resolved fresh at each element").
pub(crate) fn select_decode(reader: &mut BitReader, selector: &Selector, ctx: &mut Context) -> Result<String> {
    if selector.prefix_size_bits > 0 {
        let prefix = reader.read_int(selector.prefix_size_bits, selector.prefix_byte_order, Signedness::Unsigned)?;
        ctx.with_transient("prefix", prefix, |ctx| scan_alternatives(selector, ctx))
    } else {
        scan_alternatives(selector, ctx)
    }
}

fn scan_alternatives(selector: &Selector, ctx: &Context) -> Result<String> {
    let mut default = None;
    for alt in &selector.alternatives {
        match &alt.condition_expr {
            Some(cond) => {
                if eval::eval_str(cond, ctx)?.as_bool()? {
                    return Ok(alt.target_type.clone());
                }
            }
            None => default = Some(&alt.target_type),
        }
    }
    default
        .cloned()
        .ok_or_else(|| Error::SelectorNoMatch { field: String::new() })
}

/// Writes the prefix bits for the alternative matching `target_type`, if
/// the selector reads one. Used on encode by both the Object codec and
/// the Array codec's per-element dispatch.
pub(crate) fn write_selector_prefix(writer: &mut BitWriter, selector: &Selector, target_type: &str) -> Result<()> {
    let alt = selector
        .alternatives
        .iter()
        .find(|a| a.target_type == target_type)
        .ok_or_else(|| Error::SelectorEncode { field: String::new(), type_name: target_type.to_string() })?;
    if selector.prefix_size_bits > 0 {
        let prefix = alt.prefix_value.ok_or_else(|| {
            Error::Template(format!("selector alternative `{target_type}` has no prefix_value to encode"))
        })?;
        writer.write_int(&Value::Int(prefix), selector.prefix_size_bits, selector.prefix_byte_order, Signedness::Unsigned)?;
    }
    Ok(())
}
