use thiserror::Error;

pub type Result<A, E = Error> = std::result::Result<A, E>;

/// One variant per distinguishable recovery policy (see spec §7).
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    IoFailed(#[from] std::io::Error),

    /// Descriptor is structurally invalid; detected at template compile time.
    #[error("annotation error in field `{field}`: {message}")]
    Annotation { field: String, message: String },

    /// Two templates claim the same header prefix, or a descriptor is circular.
    #[error("template error: {0}")]
    Template(String),

    /// No codec is registered for a descriptor kind at runtime.
    #[error("no codec registered for kind `{0}`")]
    Codec(String),

    /// A single field failed to decode/encode.
    #[error("field `{field}` failed at bit {bit_position}: {cause}")]
    Field {
        field: String,
        bit_position: u64,
        cause: Box<Error>,
    },

    /// Computed checksum differs from the wire value.
    #[error("checksum mismatch for `{field}`: expected {expected:#x}, computed {computed:#x}")]
    Checksum {
        field: String,
        expected: u64,
        computed: u64,
    },

    /// String `match` regex failed.
    #[error("field `{field}` did not match pattern `{pattern}`: {value:?}")]
    Match {
        field: String,
        pattern: String,
        value: String,
    },

    /// The reader reached end-of-buffer mid-field.
    #[error("insufficient bytes: needed {needed} bits, {available} remained")]
    InsufficientBits { needed: u64, available: u64 },

    /// Expression evaluation failed (unresolved identifier, type mismatch, ...).
    #[error("expression error in `{expression}`: {message}")]
    Expression { expression: String, message: String },

    /// A selector had no matching alternative (and no default).
    #[error("selector `{field}` matched no alternative")]
    SelectorNoMatch { field: String },

    /// On encode, the runtime type of a value didn't match any selector alternative.
    #[error("selector `{field}` has no alternative for encoding value of type `{type_name}`")]
    SelectorEncode { field: String, type_name: String },

    /// Validator expression evaluated to false.
    #[error("validation failed for field `{field}`: `{condition}`")]
    Validation { field: String, condition: String },
}

impl Error {
    pub fn annotation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Annotation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn at_field(self, field: impl Into<String>, bit_position: u64) -> Self {
        Error::Field {
            field: field.into(),
            bit_position,
            cause: Box::new(self),
        }
    }
}
