//! Mapping from descriptor kind to the codec that knows how to read and
//! write it (spec §4.4 "Codec Registry and Codecs").

mod array;
mod array_primitive;
mod bitset;
mod checksum_codec;
mod integer;
mod object;
mod string;
mod string_terminated;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::bits::{BitReader, BitWriter};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::template::{Descriptor, TemplateRegistry};
use crate::value::Value;

/// Everything a codec needs besides the reader/writer and the field it's
/// working on: the registry to look itself back up for recursive
/// descriptors, and the template registry for `Object`/`Array` of
/// objects (spec §4.4 "Object codec ... Recursively invokes Template
/// Parser").
pub struct Env<'a> {
    pub codecs: &'a CodecRegistry,
    pub templates: &'a TemplateRegistry,
}

/// `{ decode(reader, descriptor, self) -> value; encode(writer,
/// descriptor, self, value) }` (spec §4.4). `ctx` carries the evaluator
/// context, already bound with the in-progress `#self`.
pub trait Codec: fmt::Debug + Send + Sync {
    fn decode(&self, reader: &mut BitReader, descriptor: &Descriptor, ctx: &mut Context, env: &Env<'_>) -> Result<Value>;

    fn encode(
        &self,
        writer: &mut BitWriter,
        descriptor: &Descriptor,
        ctx: &mut Context,
        value: &Value,
        env: &Env<'_>,
    ) -> Result<()>;
}

/// Mapping from descriptor-kind tag to [`Codec`]. Lookup is exact-match;
/// an unregistered kind fails with [`Error::Codec`] (spec §4.4).
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: HashMap<String, Arc<dyn Codec>>,
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("kinds", &self.codecs.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CodecRegistry {
    /// An empty registry with no codecs at all.
    pub fn new() -> Self {
        Self { codecs: HashMap::new() }
    }

    /// The eight built-in codecs, one per descriptor kind (spec §3
    /// "Descriptor variants").
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("integer", Arc::new(integer::IntegerCodec));
        registry.register("string", Arc::new(string::StringCodec));
        registry.register("string_terminated", Arc::new(string_terminated::StringTerminatedCodec));
        registry.register("object", Arc::new(object::ObjectCodec));
        registry.register("array", Arc::new(array::ArrayCodec));
        registry.register("array_primitive", Arc::new(array_primitive::ArrayPrimitiveCodec));
        registry.register("bitset", Arc::new(bitset::BitSetCodec));
        registry.register("checksum", Arc::new(checksum_codec::ChecksumCodec));
        registry
    }

    pub fn register(&mut self, kind: impl Into<String>, codec: Arc<dyn Codec>) {
        self.codecs.insert(kind.into(), codec);
    }

    pub fn get(&self, kind: &str) -> Result<&Arc<dyn Codec>> {
        self.codecs.get(kind).ok_or_else(|| Error::Codec(kind.to_string()))
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
