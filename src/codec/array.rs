use crate::bits::{BitReader, BitWriter};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::eval;
use crate::template::{parser, Descriptor};
use crate::value::Value;

use super::object::{select_decode, write_selector_prefix};
use super::{Codec, Env};

/// Evaluates `length_expr`, then for each index recursively delegates to
/// the element codec. Arrays of objects may carry their own per-element
/// [`crate::template::Selector`], resolved fresh at every element (spec
/// §4.4 "Array codecs").
#[derive(Debug)]
pub struct ArrayCodec;

impl Codec for ArrayCodec {
    fn decode(&self, reader: &mut BitReader, descriptor: &Descriptor, ctx: &mut Context, env: &Env<'_>) -> Result<Value> {
        let Descriptor::Array { element, length_expr, selector } = descriptor else {
            unreachable!("array codec dispatched on non-array descriptor")
        };
        let length = eval::eval_str(length_expr, ctx)?.as_u64()?;

        let mut items = Vec::with_capacity(length as usize);
        for _ in 0..length {
            let item = match selector {
                Some(selector) => {
                    let target_type = select_decode(reader, selector, ctx)?;
                    let template = env.templates.get(&target_type).ok_or_else(|| {
                        Error::Template(format!("no template registered for type `{target_type}`"))
                    })?;
                    parser::decode(template, reader, ctx, env)?
                }
                None => {
                    let codec = env.codecs.get(element.kind())?;
                    codec.decode(reader, element, ctx, env)?
                }
            };
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn encode(
        &self,
        writer: &mut BitWriter,
        descriptor: &Descriptor,
        ctx: &mut Context,
        value: &Value,
        env: &Env<'_>,
    ) -> Result<()> {
        let Descriptor::Array { element, selector, .. } = descriptor else {
            unreachable!("array codec dispatched on non-array descriptor")
        };
        let Value::Array(items) = value else {
            return Err(Error::Expression {
                expression: "<value>".into(),
                message: format!("expected array, got {value:?}"),
            });
        };

        for item in items {
            match selector {
                Some(selector) => {
                    let target_type = item.type_name().to_string();
                    write_selector_prefix(writer, selector, &target_type)?;
                    let template = env.templates.get(&target_type).ok_or_else(|| {
                        Error::Template(format!("no template registered for type `{target_type}`"))
                    })?;
                    parser::encode(template, writer, ctx, item, env)?;
                }
                None => {
                    let codec = env.codecs.get(element.kind())?;
                    codec.encode(writer, element, ctx, item, env)?;
                }
            }
        }
        Ok(())
    }
}
