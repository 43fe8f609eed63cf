//! Drives encode/decode over a compiled [`Template`] using the Codec
//! Registry and the Reader/Writer (spec §4.6 "Template Parser").

use crate::bits::{BitReader, BitWriter};
use crate::checksum;
use crate::codec::Env;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::eval;
use crate::value::{StructValue, Value};

use super::field::ChecksumPlan;
use super::Template;

/// `decode(template, reader, parent_self) -> T` (spec §4.6).
pub fn decode(template: &Template, reader: &mut BitReader, ctx: &mut Context, env: &Env<'_>) -> Result<Value> {
    let start_bit = reader.bit_position();
    let mut fields = StructValue::new(template.name.clone());
    let previous_self = ctx.self_value().cloned();
    ctx.bind_self(Value::Struct(fields.clone()));

    let outcome = decode_into(template, reader, ctx, env, &mut fields, start_bit);

    restore_self(ctx, previous_self);
    outcome.map(|()| Value::Struct(fields))
}

fn decode_into(
    template: &Template,
    reader: &mut BitReader,
    ctx: &mut Context,
    env: &Env<'_>,
    fields: &mut StructValue,
    start_bit: u64,
) -> Result<()> {
    for field in &template.fields {
        if let Some(cond) = &field.condition_expr {
            if !eval::eval_str(cond, ctx)?.as_bool()? {
                continue;
            }
        }

        let bit_position = reader.bit_position();
        let codec = env.codecs.get(field.descriptor.kind())?;
        let raw = codec
            .decode(reader, &field.descriptor, ctx, env)
            .map_err(|e| e.at_field(field.name.clone(), bit_position))?;

        if let Some(validator) = &field.validator_expr {
            let passed = ctx
                .with_transient("raw", raw.clone(), |c| eval::eval_str(validator, c)?.as_bool())
                .map_err(|e| e.at_field(field.name.clone(), bit_position))?;
            if !passed {
                return Err(Error::Validation { field: field.name.clone(), condition: validator.clone() }
                    .at_field(field.name.clone(), bit_position));
            }
        }

        let value = match &field.converter {
            Some(converter) => ctx
                .with_transient("raw", raw, |c| eval::eval_str(&converter.decode_expr, c))
                .map_err(|e| e.at_field(field.name.clone(), bit_position))?,
            None => raw,
        };

        fields.set(field.name.clone(), value);
        ctx.bind_self(Value::Struct(fields.clone()));
    }

    for evaluated in &template.evaluated_fields {
        let bit_position = reader.bit_position();
        let value = eval::eval_str(&evaluated.expression, ctx)
            .map_err(|e| e.at_field(evaluated.target_field.clone(), bit_position))?;
        fields.set(evaluated.target_field.clone(), value);
        ctx.bind_self(Value::Struct(fields.clone()));
    }

    if let Some(plan) = &template.checksum {
        verify_checksum(plan, reader, fields, start_bit)?;
    }

    Ok(())
}

/// `encode(template, writer, parent_self, T)` (spec §4.6). Two
/// asymmetries with decode: the checksum field is a zero placeholder
/// during the main pass and patched afterward, and evaluated fields are
/// never written.
pub fn encode(template: &Template, writer: &mut BitWriter, ctx: &mut Context, value: &Value, env: &Env<'_>) -> Result<()> {
    let fields = value.as_struct()?;
    let start_bit = writer.bit_position();
    let previous_self = ctx.self_value().cloned();
    ctx.bind_self(value.clone());

    let outcome = encode_fields(template, writer, ctx, env, fields, start_bit);

    restore_self(ctx, previous_self);
    outcome
}

fn encode_fields(
    template: &Template,
    writer: &mut BitWriter,
    ctx: &mut Context,
    env: &Env<'_>,
    fields: &StructValue,
    start_bit: u64,
) -> Result<()> {
    let mut checksum_bit_position = None;

    for field in &template.fields {
        if let Some(cond) = &field.condition_expr {
            if !eval::eval_str(cond, ctx)?.as_bool()? {
                continue;
            }
        }

        let bit_position = writer.bit_position();
        if field.descriptor.kind() == "checksum" {
            checksum_bit_position = Some(bit_position);
        }

        let field_value = fields.get(&field.name).cloned().unwrap_or(Value::Null);
        let raw = match &field.converter {
            Some(converter) => ctx
                .with_transient("raw", field_value, |c| eval::eval_str(&converter.encode_expr, c))
                .map_err(|e| e.at_field(field.name.clone(), bit_position))?,
            None => field_value,
        };

        let codec = env.codecs.get(field.descriptor.kind())?;
        codec
            .encode(writer, &field.descriptor, ctx, &raw, env)
            .map_err(|e| e.at_field(field.name.clone(), bit_position))?;
    }

    if let Some(plan) = &template.checksum {
        let bit_position = checksum_bit_position
            .ok_or_else(|| Error::Template(format!("template `{}` has no checksum field to patch", template.name)))?;
        patch_checksum(plan, writer, start_bit, bit_position)?;
    }

    Ok(())
}

fn restore_self(ctx: &mut Context, previous_self: Option<Value>) {
    match previous_self {
        Some(v) => ctx.bind_self(v),
        None => ctx.unbind_self(),
    }
}

/// Computes the algorithm over `[start_bit/8 + skip_start, end_byte -
/// skip_end)` and compares it to the value already decoded into the
/// checksum field (spec §4.6 step 5).
fn verify_checksum(plan: &ChecksumPlan, reader: &BitReader, fields: &StructValue, start_bit: u64) -> Result<()> {
    let algorithm = checksum::resolve(&plan.algorithm)?;
    let start_byte = (start_bit / 8) as usize + plan.skip_start as usize;
    let end_byte = (reader.byte_position() as usize).saturating_sub(plan.skip_end as usize);
    let bytes = reader.bytes().get(start_byte..end_byte).unwrap_or(&[]);
    let computed = algorithm.compute(bytes, plan.start_value);

    let expected = fields
        .get(&plan.field_name)
        .map(|v| v.as_u64())
        .transpose()?
        .unwrap_or(0);

    if expected != computed {
        return Err(Error::Checksum { field: plan.field_name.clone(), expected, computed });
    }
    Ok(())
}

/// Computes the algorithm over the already-written byte range and
/// patches the placeholder slot in place (spec §4.6 encode asymmetry).
fn patch_checksum(plan: &ChecksumPlan, writer: &mut BitWriter, start_bit: u64, checksum_bit_position: u64) -> Result<()> {
    let algorithm = checksum::resolve(&plan.algorithm)?;
    let start_byte = (start_bit / 8) as usize + plan.skip_start as usize;
    let end_byte = (writer.byte_position() as usize).saturating_sub(plan.skip_end as usize);
    let bytes = writer.bytes().get(start_byte..end_byte).unwrap_or(&[]);
    let computed = algorithm.compute(bytes, plan.start_value);
    writer.patch_checksum(checksum_bit_position, plan.result_bit_size, computed);
    Ok(())
}
