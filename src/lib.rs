//! Declarative, annotation-driven binary message codec core: bit-exact
//! I/O, a restricted expression evaluator, pattern matching and
//! checksums for message framing, and a codec/template layer that turns
//! a compiled [`template::Template`] into decode/encode over a
//! dynamically-typed [`value::Value`] tree.

pub mod bits;
pub mod charset;
pub mod checksum;
pub mod codec;
pub mod context;
pub mod describe;
pub mod error;
pub mod eval;
pub mod facade;
pub mod pattern;
pub mod template;
pub mod value;

pub use error::{Error, Result};
pub use facade::{Boxon, Response};
pub use value::{StructValue, Value};
