use std::sync::Arc;

use indexmap::IndexMap;

use crate::bits::BitReader;
use crate::pattern;

use super::Template;

/// Name-keyed collection of compiled templates, also indexed by their
/// header-start byte patterns (spec §4.7 "Template Loader"). A real
/// arena-of-templates addressed by index would let two templates refer
/// to each other by slot before either is fully built; naming templates
/// instead and resolving references at decode/encode time sidesteps that
/// up-front allocation problem entirely (see DESIGN.md).
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: IndexMap<String, Arc<Template>>,
    /// `(pattern, template name)`, kept sorted longest-pattern-first so a
    /// longer header is never masked by a shorter one that prefixes it.
    patterns: Vec<(Vec<u8>, String)>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, template: Template) {
        for start in &template.header.start_patterns {
            self.patterns.push((start.clone(), template.name.clone()));
        }
        self.patterns.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        self.templates.insert(template.name.clone(), Arc::new(template));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Template>> {
        self.templates.get(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Matches a registered header pattern at the reader's current byte
    /// offset, returning the template and the number of prefix bytes the
    /// matched pattern consumed.
    pub fn find_template(&self, reader: &BitReader) -> Option<(Arc<Template>, u64)> {
        let bytes = reader.bytes();
        let offset = reader.byte_position() as usize;
        self.match_at(bytes, offset)
    }

    fn match_at(&self, bytes: &[u8], offset: usize) -> Option<(Arc<Template>, u64)> {
        self.patterns.iter().find_map(|(pattern, name)| {
            let end = offset.checked_add(pattern.len())?;
            if end <= bytes.len() && &bytes[offset..end] == pattern.as_slice() {
                self.templates.get(name).map(|t| (Arc::clone(t), pattern.len() as u64))
            } else {
                None
            }
        })
    }

    /// Scans `bytes` from `offset` for the nearest header pattern,
    /// returning the byte index at which the next message may start. The
    /// gap before it is unknown/unframed data (spec §4.7).
    pub fn find_next(&self, bytes: &[u8], offset: usize) -> Option<usize> {
        self.patterns
            .iter()
            .filter_map(|(pattern, _)| pattern::find(bytes, offset, pattern))
            .min()
    }
}
