use crate::eval;

use super::descriptor::Descriptor;
use super::field::{ChecksumPlan, EvaluatedFieldPlan, FieldPlan, Header};
use super::Template;

/// Builds a [`Template`] field by field, in source order (spec §4.5
/// "Template Compiler"). There is no reflection over a user type to
/// drive this — the caller declares each field explicitly, the way a
/// [`crate::template::registry::TemplateRegistry`] user assembles a
/// `PdbBuilder`-style object graph by hand.
#[derive(Debug, Default)]
pub struct TemplateBuilder {
    name: String,
    header: Header,
    fields: Vec<FieldPlan>,
    evaluated_fields: Vec<EvaluatedFieldPlan>,
    checksum: Option<ChecksumPlan>,
}

impl TemplateBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn header(&mut self, header: Header) -> &mut Self {
        self.header = header;
        self
    }

    pub fn field(&mut self, field: FieldPlan) -> &mut Self {
        self.fields.push(field);
        self
    }

    pub fn evaluated_field(&mut self, field: EvaluatedFieldPlan) -> &mut Self {
        self.evaluated_fields.push(field);
        self
    }

    pub fn checksum(&mut self, checksum: ChecksumPlan) -> &mut Self {
        self.checksum = Some(checksum);
        self
    }

    /// Compiles the accumulated declarations into a [`Template`]. This
    /// never fails outright: structural problems are recorded in
    /// `compile_errors` and flip `can_be_coded` to `false`, mirroring the
    /// "mismatches emit a compile-time template error and mark the
    /// template can-be-coded = false" contract rather than aborting
    /// construction.
    pub fn build(self) -> Template {
        let mut errors = Vec::new();

        if self.header.start_patterns.is_empty() {
            errors.push("header declares no start pattern".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.clone()) {
                errors.push(format!("duplicate field name `{}`", field.name));
            }
            check_field_expressions(field, &mut errors);
        }

        for evaluated in &self.evaluated_fields {
            if let Err(e) = eval::parse(&evaluated.expression) {
                errors.push(format!(
                    "evaluated field `{}`: {e}",
                    evaluated.target_field
                ));
            }
        }

        if let Some(checksum) = &self.checksum {
            if self.fields.iter().all(|f| f.name != checksum.field_name) {
                errors.push(format!(
                    "checksum references unknown field `{}`",
                    checksum.field_name
                ));
            }
        }

        let can_be_coded = errors.is_empty();
        Template {
            name: self.name,
            header: self.header,
            fields: self.fields,
            evaluated_fields: self.evaluated_fields,
            checksum: self.checksum,
            can_be_coded,
            compile_errors: errors,
        }
    }
}

fn check_field_expressions(field: &FieldPlan, errors: &mut Vec<String>) {
    let mut check = |label: &str, expr: &str| {
        if let Err(e) = eval::parse(expr) {
            errors.push(format!("field `{}` {label} `{expr}`: {e}", field.name));
        }
    };

    if let Some(cond) = &field.condition_expr {
        check("condition", cond);
    }
    if let Some(validator) = &field.validator_expr {
        check("validator", validator);
    }
    if let Some(converter) = &field.converter {
        check("converter decode", &converter.decode_expr);
        check("converter encode", &converter.encode_expr);
    }
    drop(check);

    if field.converter.is_some() && !descriptor_accepts_converter(&field.descriptor) {
        errors.push(format!(
            "field `{}` declares a converter on a `{}` descriptor, which spec §6's \
             annotation table does not list `converter` as a valid option for",
            field.name,
            field.descriptor.kind()
        ));
    }

    match &field.descriptor {
        Descriptor::Integer { bit_size_expr, .. } => check("size", bit_size_expr),
        Descriptor::String { byte_size_expr, .. } => check("size", byte_size_expr),
        Descriptor::BitSet { bit_size_expr, .. } => check("size", bit_size_expr),
        Descriptor::Array { length_expr, selector, .. } => {
            check("size", length_expr);
            check_selector(selector, field, errors);
        }
        Descriptor::ArrayPrimitive { length_expr, .. } => check("size", length_expr),
        Descriptor::Object { selector, .. } => check_selector(selector, field, errors),
        _ => {}
    }
}

/// Spec §4.5 step 4 asks the compiler to reject a converter whose decode
/// input/output types don't line up with the codec's output and the
/// field's declared type. This Rust port has no separate static field
/// type to check against — every codec decodes into the same dynamic
/// [`crate::value::Value`] and a converter is just an expression pair
/// evaluated over it (see DESIGN.md's Open Question decisions) — so the
/// compatibility check that *is* meaningful here is structural: spec §6's
/// annotation table only lists `converter` as a valid option for
/// `Integer`, `String`, `Object`, `Array`, and `ArrayPrimitive`; declaring
/// one on `StringTerminated`, `BitSet`, or `Checksum` is a template error.
fn descriptor_accepts_converter(descriptor: &Descriptor) -> bool {
    !matches!(
        descriptor,
        Descriptor::StringTerminated { .. } | Descriptor::BitSet { .. } | Descriptor::Checksum { .. }
    )
}

fn check_selector(
    selector: &Option<super::descriptor::Selector>,
    field: &FieldPlan,
    errors: &mut Vec<String>,
) {
    let Some(selector) = selector else { return };
    for alt in &selector.alternatives {
        if let Some(cond) = &alt.condition_expr {
            if let Err(e) = eval::parse(cond) {
                errors.push(format!(
                    "field `{}` selector alternative `{}`: {e}",
                    field.name, alt.target_type
                ));
            }
        }
    }
}
