//! The external API: multi-message parsing over a byte slice, single
//! message composition, metadata description, and core configuration
//! (spec §6 "Runtime façade").

use std::sync::Arc;

use indexmap::IndexMap;

use crate::bits::{BitReader, BitWriter};
use crate::codec::{Codec, CodecRegistry, Env};
use crate::context::{Context, StaticFn};
use crate::describe::{self, Metadata};
use crate::error::{Error, Result};
use crate::template::{parser, Template, TemplateRegistry};
use crate::value::Value;

/// Per-message result: either the decoded message, or a structured
/// error paired with the original bytes it came from, so a caller can
/// inspect what failed to parse (spec §3 "Response<Src, Msg>").
#[derive(Debug)]
pub enum Response<Src, Msg> {
    Ok(Msg),
    Err { error: Error, source: Src },
}

/// Orchestrates the Template Loader, Codec Registry, and Template Parser
/// over a shared, immutable-after-setup configuration (spec §6).
pub struct Boxon {
    codecs: CodecRegistry,
    templates: TemplateRegistry,
    context: Context,
}

impl Default for Boxon {
    fn default() -> Self {
        Self::new()
    }
}

impl Boxon {
    pub fn new() -> Self {
        Self {
            codecs: CodecRegistry::with_defaults(),
            templates: TemplateRegistry::new(),
            context: Context::default(),
        }
    }

    pub fn register_codec(&mut self, kind: impl Into<String>, codec: Arc<dyn Codec>) {
        self.codecs.register(kind, codec);
    }

    pub fn register_template(&mut self, template: Template) {
        if !template.can_be_coded {
            log::warn!(
                "registering template `{}` with compile errors: {:?}",
                template.name,
                template.compile_errors
            );
        }
        self.templates.register(template);
    }

    pub fn set_context(&mut self, base: IndexMap<String, Value>) {
        self.context = Context::new(base);
    }

    pub fn register_static(&mut self, type_path: impl Into<String>, method: impl Into<String>, f: StaticFn) {
        self.context.register_static(type_path, method, f);
    }

    pub fn describe(&self, type_name: &str) -> Result<Metadata> {
        let template = self.lookup(type_name)?;
        Ok(describe::describe(template))
    }

    /// Single-message round trip: looks up the template by the value's
    /// own type name and writes it (spec §6 "compose").
    pub fn compose(&self, value: &Value) -> Result<Vec<u8>> {
        let type_name = value.type_name();
        let template = self.lookup(type_name)?;
        let mut writer = BitWriter::new();
        let mut ctx = self.context.clone();
        let env = Env { codecs: &self.codecs, templates: &self.templates };
        parser::encode(template, &mut writer, &mut ctx, value, &env)?;
        Ok(writer.into_bytes())
    }

    /// Scans `bytes` for known headers and emits one [`Response`] per
    /// message, skipping and reporting any unframed gaps (spec §4.7,
    /// §6 "parse").
    pub fn parse(&self, bytes: &[u8]) -> Vec<Response<Vec<u8>, Value>> {
        let mut responses = Vec::new();
        let mut offset = 0usize;

        while offset < bytes.len() {
            let mut reader = positioned_reader(bytes, offset);
            match self.templates.find_template(&reader) {
                Some((template, _prefix_len)) => {
                    let mut ctx = self.context.clone();
                    let env = Env { codecs: &self.codecs, templates: &self.templates };

                    match parser::decode(&template, &mut reader, &mut ctx, &env) {
                        Ok(value) => {
                            let end = reader.byte_position() as usize;
                            log::debug!("decoded `{}` at byte {offset}..{end}", template.name);
                            responses.push(Response::Ok(value));
                            offset = end.max(offset + 1);
                        }
                        Err(error) => {
                            let resume = self.templates.find_next(bytes, offset + 1).unwrap_or(bytes.len());
                            log::warn!(
                                "`{}` failed to decode at byte {offset}: {error}; resuming at {resume}",
                                template.name
                            );
                            responses.push(Response::Err { error, source: bytes[offset..resume].to_vec() });
                            offset = resume;
                        }
                    }
                }
                None => match self.templates.find_next(bytes, offset) {
                    Some(next) if next > offset => {
                        log::debug!("skipping {} unframed bytes before the next header", next - offset);
                        responses.push(Response::Err {
                            error: Error::Template("no header pattern matched".to_string()),
                            source: bytes[offset..next].to_vec(),
                        });
                        offset = next;
                    }
                    Some(next) => offset = next + 1,
                    None => {
                        responses.push(Response::Err {
                            error: Error::Template("no header pattern matched".to_string()),
                            source: bytes[offset..].to_vec(),
                        });
                        break;
                    }
                },
            }
        }

        responses
    }

    fn lookup(&self, type_name: &str) -> Result<&Arc<Template>> {
        self.templates
            .get(type_name)
            .ok_or_else(|| Error::Template(format!("no template registered for type `{type_name}`")))
    }
}

fn positioned_reader(bytes: &[u8], byte_offset: usize) -> BitReader {
    let mut reader = BitReader::new(bytes.to_vec());
    reader.set_bit_position(byte_offset as u64 * 8);
    reader
}
