//! Streaming re-serialization of surviving units
//!
//! Accumulates output text and emits a discrete chunk whenever the
//! accumulated size crosses the flush threshold, so the writer's own
//! footprint stays bounded regardless of total output size. Element opens
//! and closes go through a generic stack; `close` emits the matching
//! closing tags in strict reverse order of opening.

use std::mem;

use crate::error::{Error, Result};
use crate::markup::escape;
use crate::model::{Header, TranslationUnit};

/// Version attribute written on the root element when the input did not
/// declare one
const FORMAT_VERSION: &str = "1.4";

/// Chunked writer for the output file
#[derive(Debug)]
pub struct StreamingWriter {
    flush_threshold: usize,
    version: Option<String>,
    buf: String,
    chunks: Vec<String>,
    stack: Vec<String>,
    opened: bool,
}

impl StreamingWriter {
    /// Create a writer that flushes a chunk every `flush_threshold` bytes
    pub fn new(flush_threshold: usize) -> Self {
        Self {
            flush_threshold,
            version: None,
            buf: String::new(),
            chunks: Vec::new(),
            stack: Vec::new(),
            opened: false,
        }
    }

    /// Echo the input's root version instead of the default
    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    /// Write the root element and header, then open the body
    pub fn open(&mut self, header: &Header) -> Result<()> {
        if self.opened {
            return Err(Error::WriterStructure {
                reason: "writer opened twice".into(),
            });
        }
        self.opened = true;

        let version = self.version.as_deref().unwrap_or(FORMAT_VERSION).to_string();
        self.start_element("tmx", &[("version", &version)]);
        self.buf.push('\n');

        let attrs: Vec<(&str, &str)> = header
            .attributes
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
            .collect();
        self.start_element("header", &attrs);
        for prop in &header.properties {
            self.start_element("prop", &[("type", prop.prop_type.as_str())]);
            self.buf.push_str(&escape(&prop.text));
            self.end_element()?;
        }
        self.end_element()?;
        self.buf.push('\n');

        self.start_element("body", &[]);
        self.buf.push('\n');
        self.maybe_flush();
        Ok(())
    }

    /// Serialize one surviving unit
    ///
    /// Callers filter deleted units; the writer emits everything it is given.
    pub fn write_unit(&mut self, unit: &TranslationUnit) -> Result<()> {
        if !self.opened {
            return Err(Error::WriterStructure {
                reason: "write_unit before open".into(),
            });
        }

        let attrs = &unit.attrs;
        let mut tu_attrs: Vec<(&str, &str)> = Vec::new();
        for (name, value) in [
            ("creationid", attrs.creation_id.as_str()),
            ("changeid", attrs.change_id.as_str()),
            ("creationdate", attrs.creation_date.as_str()),
            ("changedate", attrs.change_date.as_str()),
        ] {
            // The empty marker means "absent"; don't serialize it
            if !value.is_empty() {
                tu_attrs.push((name, value));
            }
        }

        self.start_element("tu", &tu_attrs);
        for variant in unit.variants() {
            self.start_element("tuv", &[("xml:lang", variant.lang.as_str())]);
            self.start_element("seg", &[]);
            self.buf.push_str(&escape(&variant.text));
            self.end_element()?; // seg
            self.end_element()?; // tuv
        }
        self.end_element()?; // tu
        self.buf.push('\n');

        self.maybe_flush();
        Ok(())
    }

    /// Close every open element and return the output chunks
    ///
    /// Nothing is observable by the caller before this succeeds.
    pub fn close(mut self) -> Result<Vec<String>> {
        if !self.opened {
            return Err(Error::WriterStructure {
                reason: "close before open".into(),
            });
        }
        while !self.stack.is_empty() {
            self.end_element()?;
            self.buf.push('\n');
        }
        if !self.buf.is_empty() {
            self.chunks.push(mem::take(&mut self.buf));
        }
        Ok(self.chunks)
    }

    /// Emit an opening tag and push it on the element stack
    fn start_element(&mut self, name: &str, attrs: &[(&str, &str)]) {
        self.buf.push('<');
        self.buf.push_str(name);
        for (attr_name, value) in attrs {
            self.buf.push(' ');
            self.buf.push_str(attr_name);
            self.buf.push_str("=\"");
            self.buf.push_str(&escape(value));
            self.buf.push('"');
        }
        self.buf.push('>');
        self.stack.push(name.to_string());
    }

    /// Pop the innermost element and emit its closing tag
    fn end_element(&mut self) -> Result<()> {
        let name = self.stack.pop().ok_or_else(|| Error::WriterStructure {
            reason: "closing more elements than were opened".into(),
        })?;
        self.buf.push_str("</");
        self.buf.push_str(&name);
        self.buf.push('>');
        Ok(())
    }

    fn maybe_flush(&mut self) {
        if self.buf.len() >= self.flush_threshold {
            self.chunks.push(mem::take(&mut self.buf));
        }
    }
}
