//! The compiled plan for a message type, and the machinery that builds,
//! indexes, and drives it (spec §4.5-§4.7).

pub mod builder;
pub mod descriptor;
pub mod field;
pub mod parser;
pub mod registry;

pub use builder::TemplateBuilder;
pub use descriptor::{Descriptor, PrimitiveKind, Selector, SelectorAlternative};
pub use field::{ChecksumPlan, EvaluatedFieldPlan, FieldPlan, Header};
pub use registry::TemplateRegistry;

/// The immutable compiled plan for one message type (spec §3 `Template<T>`).
/// Built once, referenced (never copied) at each encode/decode.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    pub header: Header,
    pub fields: Vec<FieldPlan>,
    pub evaluated_fields: Vec<EvaluatedFieldPlan>,
    pub checksum: Option<ChecksumPlan>,
    /// `false` if any field failed validation at compile time (spec §3).
    pub can_be_coded: bool,
    pub compile_errors: Vec<String>,
}

impl Template {
    pub fn field(&self, name: &str) -> Option<&FieldPlan> {
        self.fields.iter().find(|f| f.name == name)
    }
}
