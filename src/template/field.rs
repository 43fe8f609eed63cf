use crate::charset::Charset;

use super::descriptor::{Converter, Descriptor};

/// Literal byte patterns a message may begin (and optionally end) with,
/// plus the charset its terminator-delimited text fields use by default
/// (spec §6 "Header").
#[derive(Debug, Clone, Default)]
pub struct Header {
    pub start_patterns: Vec<Vec<u8>>,
    pub end_pattern: Option<Vec<u8>>,
    pub charset: Charset,
}

/// A single wire-level field contract (spec §3 "FieldPlan").
#[derive(Debug, Clone)]
pub struct FieldPlan {
    pub name: String,
    pub descriptor: Descriptor,
    pub condition_expr: Option<String>,
    pub validator_expr: Option<String>,
    pub converter: Option<Converter>,
}

impl FieldPlan {
    pub fn new(name: impl Into<String>, descriptor: Descriptor) -> Self {
        Self {
            name: name.into(),
            descriptor,
            condition_expr: None,
            validator_expr: None,
            converter: None,
        }
    }
}

/// Runs after all wire fields are assigned; a pure side effect on the
/// value being built (spec §3 "EvaluatedFieldPlan").
#[derive(Debug, Clone)]
pub struct EvaluatedFieldPlan {
    pub target_field: String,
    pub expression: String,
}

/// The covered range is `[skip_start, total_length - skip_end)` relative
/// to the recorded encode/decode start (spec §3 "ChecksumPlan").
#[derive(Debug, Clone)]
pub struct ChecksumPlan {
    pub field_name: String,
    pub algorithm: String,
    pub skip_start: u64,
    pub skip_end: u64,
    pub start_value: u64,
    pub result_bit_size: u32,
}
