//! Emits a recursive, language-neutral metadata map for a [`Template`]
//! (spec §4.8). Pure data — this module performs no I/O.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::eval::{self, Expr};
use crate::template::{Descriptor, Selector, Template};

/// A JSON-shaped metadata tree, independent of any serialization crate
/// so a caller can render it however it likes (spec §4.8 "map-of-maps").
#[derive(Debug, Clone, PartialEq)]
pub enum Metadata {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<Metadata>),
    Map(IndexMap<String, Metadata>),
}

impl Metadata {
    fn map() -> Self {
        Metadata::Map(IndexMap::new())
    }

    fn insert(&mut self, key: &str, value: Metadata) {
        if let Metadata::Map(m) = self {
            m.insert(key.to_string(), value);
        }
    }

    fn str_opt(value: &Option<String>) -> Metadata {
        match value {
            Some(s) => Metadata::Str(s.clone()),
            None => Metadata::Null,
        }
    }
}

/// Describes `template`'s shape: header, ordered fields, evaluated
/// fields, and checksum, plus the set of `#name` context identifiers its
/// expressions reference (spec §4.8 "root has ... context ..."). This is
/// collected statically from the compiled expressions, not read off a
/// live [`crate::context::Context`] (see SPEC_FULL.md §4 on why a dump of
/// the live context wouldn't show what a template actually depends on).
pub fn describe(template: &Template) -> Metadata {
    let mut root = Metadata::map();
    root.insert("template", Metadata::Str(template.name.clone()));
    root.insert(
        "context",
        Metadata::List(context_refs(template).into_iter().map(Metadata::Str).collect()),
    );
    root.insert("header", describe_header(template));
    root.insert(
        "fields",
        Metadata::List(template.fields.iter().map(describe_field).collect()),
    );
    root.insert(
        "evaluatedFields",
        Metadata::List(
            template
                .evaluated_fields
                .iter()
                .map(|ef| {
                    let mut m = Metadata::map();
                    m.insert("targetField", Metadata::Str(ef.target_field.clone()));
                    m.insert("expression", Metadata::Str(ef.expression.clone()));
                    m
                })
                .collect(),
        ),
    );
    if let Some(checksum) = &template.checksum {
        let mut m = Metadata::map();
        m.insert("field", Metadata::Str(checksum.field_name.clone()));
        m.insert("algorithm", Metadata::Str(checksum.algorithm.clone()));
        m.insert("skipStart", Metadata::Int(checksum.skip_start as i64));
        m.insert("skipEnd", Metadata::Int(checksum.skip_end as i64));
        m.insert("startValue", Metadata::Int(checksum.start_value as i64));
        m.insert("resultBitSize", Metadata::Int(checksum.result_bit_size as i64));
        root.insert("checksum", m);
    } else {
        root.insert("checksum", Metadata::Null);
    }
    root
}

fn describe_header(template: &Template) -> Metadata {
    let mut m = Metadata::map();
    m.insert(
        "start",
        Metadata::List(
            template
                .header
                .start_patterns
                .iter()
                .map(|p| Metadata::Str(hex_string(p)))
                .collect(),
        ),
    );
    m.insert("end", match &template.header.end_pattern {
        Some(p) => Metadata::Str(hex_string(p)),
        None => Metadata::Null,
    });
    m.insert("charset", Metadata::Str(template.header.charset.canonical_name().to_string()));
    m
}

fn describe_field(field: &crate::template::FieldPlan) -> Metadata {
    let mut m = Metadata::map();
    m.insert("name", Metadata::Str(field.name.clone()));
    m.insert("kind", Metadata::Str(field.descriptor.kind().to_string()));
    m.insert("condition", Metadata::str_opt(&field.condition_expr));
    m.insert("validator", Metadata::str_opt(&field.validator_expr));
    m.insert(
        "converter",
        match &field.converter {
            Some(c) => {
                let mut cm = Metadata::map();
                cm.insert("decode", Metadata::Str(c.decode_expr.clone()));
                cm.insert("encode", Metadata::Str(c.encode_expr.clone()));
                cm
            }
            None => Metadata::Null,
        },
    );
    m.insert("descriptor", describe_descriptor(&field.descriptor));
    m
}

fn describe_descriptor(descriptor: &Descriptor) -> Metadata {
    let mut m = Metadata::map();
    match descriptor {
        Descriptor::Integer { bit_size_expr, byte_order, signedness } => {
            m.insert("size", Metadata::Str(bit_size_expr.clone()));
            m.insert("byteOrder", Metadata::Str(format!("{byte_order:?}")));
            m.insert("signedness", Metadata::Str(format!("{signedness:?}")));
        }
        Descriptor::String { byte_size_expr, charset, match_pattern } => {
            m.insert("size", Metadata::Str(byte_size_expr.clone()));
            m.insert("charset", Metadata::Str(charset.canonical_name().to_string()));
            m.insert("match", Metadata::str_opt(match_pattern));
        }
        Descriptor::StringTerminated { terminator_byte, consume_terminator, charset } => {
            m.insert("terminator", Metadata::Int(*terminator_byte as i64));
            m.insert("consumeTerminator", Metadata::Bool(*consume_terminator));
            m.insert("charset", Metadata::Str(charset.canonical_name().to_string()));
        }
        Descriptor::Object { static_type, selector } => {
            m.insert("type", Metadata::Str(static_type.clone()));
            m.insert("selectFrom", describe_selector_opt(selector));
        }
        Descriptor::Array { element, length_expr, selector } => {
            m.insert("type", describe_descriptor(element));
            m.insert("size", Metadata::Str(length_expr.clone()));
            m.insert("selectFrom", describe_selector_opt(selector));
        }
        Descriptor::ArrayPrimitive { element_kind, length_expr, byte_order } => {
            m.insert("elementKind", Metadata::Str(format!("{element_kind:?}")));
            m.insert("size", Metadata::Str(length_expr.clone()));
            m.insert("byteOrder", Metadata::Str(format!("{byte_order:?}")));
        }
        Descriptor::BitSet { bit_size_expr, byte_order } => {
            m.insert("size", Metadata::Str(bit_size_expr.clone()));
            m.insert("byteOrder", Metadata::Str(format!("{byte_order:?}")));
        }
        Descriptor::Checksum { algorithm, skip_start_bytes, skip_end_bytes, start_value, result_bit_size } => {
            m.insert("algorithm", Metadata::Str(algorithm.clone()));
            m.insert("skipStart", Metadata::Int(*skip_start_bytes as i64));
            m.insert("skipEnd", Metadata::Int(*skip_end_bytes as i64));
            m.insert("startValue", Metadata::Int(*start_value as i64));
            m.insert("resultBitSize", Metadata::Int(*result_bit_size as i64));
        }
    }
    m
}

fn describe_selector_opt(selector: &Option<Selector>) -> Metadata {
    let Some(selector) = selector else { return Metadata::Null };
    let mut m = Metadata::map();
    m.insert("prefixSizeBits", Metadata::Int(selector.prefix_size_bits as i64));
    m.insert("prefixByteOrder", Metadata::Str(format!("{:?}", selector.prefix_byte_order)));
    m.insert(
        "alternatives",
        Metadata::List(
            selector
                .alternatives
                .iter()
                .map(|alt| {
                    let mut am = Metadata::map();
                    am.insert("condition", Metadata::str_opt(&alt.condition_expr));
                    am.insert("targetType", Metadata::Str(alt.target_type.clone()));
                    am
                })
                .collect(),
        ),
    );
    m
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Every `#name` identifier referenced by `template`'s field conditions,
/// validators, converters, descriptor-embedded size expressions, selector
/// alternatives, and evaluated fields, deduplicated and sorted.
fn context_refs(template: &Template) -> Vec<String> {
    let mut refs = BTreeSet::new();
    for field in &template.fields {
        add_expr(&mut refs, field.condition_expr.as_deref());
        add_expr(&mut refs, field.validator_expr.as_deref());
        if let Some(converter) = &field.converter {
            add_expr(&mut refs, Some(&converter.decode_expr));
            add_expr(&mut refs, Some(&converter.encode_expr));
        }
        add_descriptor_refs(&mut refs, &field.descriptor);
    }
    for evaluated in &template.evaluated_fields {
        add_expr(&mut refs, Some(&evaluated.expression));
    }
    refs.into_iter().collect()
}

fn add_descriptor_refs(refs: &mut BTreeSet<String>, descriptor: &Descriptor) {
    match descriptor {
        Descriptor::Integer { bit_size_expr, .. } => add_expr(refs, Some(bit_size_expr)),
        Descriptor::String { byte_size_expr, .. } => add_expr(refs, Some(byte_size_expr)),
        Descriptor::BitSet { bit_size_expr, .. } => add_expr(refs, Some(bit_size_expr)),
        Descriptor::Array { element, length_expr, selector } => {
            add_expr(refs, Some(length_expr));
            add_descriptor_refs(refs, element);
            add_selector_refs(refs, selector);
        }
        Descriptor::ArrayPrimitive { length_expr, .. } => add_expr(refs, Some(length_expr)),
        Descriptor::Object { selector, .. } => add_selector_refs(refs, selector),
        Descriptor::StringTerminated { .. } | Descriptor::Checksum { .. } => {}
    }
}

fn add_selector_refs(refs: &mut BTreeSet<String>, selector: &Option<Selector>) {
    let Some(selector) = selector else { return };
    for alt in &selector.alternatives {
        add_expr(refs, alt.condition_expr.as_deref());
    }
}

fn add_expr(refs: &mut BTreeSet<String>, src: Option<&str>) {
    let Some(src) = src else { return };
    if let Ok(expr) = eval::parse(src) {
        collect_refs(&expr, refs);
    }
}

fn collect_refs(expr: &Expr, refs: &mut BTreeSet<String>) {
    match expr {
        Expr::ContextRef(name) => {
            refs.insert(name.clone());
        }
        Expr::FieldAccess(base, _) => collect_refs(base, refs),
        Expr::MethodCall(base, _, args) => {
            collect_refs(base, refs);
            args.iter().for_each(|a| collect_refs(a, refs));
        }
        Expr::StaticCall(_, _, args) => args.iter().for_each(|a| collect_refs(a, refs)),
        Expr::Unary(_, inner) => collect_refs(inner, refs),
        Expr::Binary(_, lhs, rhs) => {
            collect_refs(lhs, refs);
            collect_refs(rhs, refs);
        }
        Expr::Ternary(cond, then_branch, else_branch) => {
            collect_refs(cond, refs);
            collect_refs(then_branch, refs);
            collect_refs(else_branch, refs);
        }
        Expr::Null | Expr::Bool(_) | Expr::Int(_) | Expr::Float(_) | Expr::Str(_) => {}
    }
}
