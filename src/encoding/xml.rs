//! XML codec
//!
//! XML has no native value model, so elements are mapped onto [`Value`]:
//!
//! - a root element decodes to `{name: content}`
//! - attributes become `@name` keys holding strings
//! - child elements become keys; a name seen twice becomes an array
//! - text-only content becomes a string, text next to attributes or
//!   children goes under `#text`
//! - an element with no attributes, children or text is `null`
//!
//! All scalars decode as strings. The encoder applies the inverse mapping;
//! values that are not a single-key object are wrapped in a root element.

use quick_xml::escape::unescape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::Map;
use std::io::{BufRead, Write};

use super::{Decoder, DecoderMaker, Encoder, EncoderMaker, Value};
use crate::errors::{CodecflowError, Result};

/// Root element name used when an encoded value does not name its own
pub const DEFAULT_ROOT: &str = "root";

const TEXT_KEY: &str = "#text";
const ATTR_PREFIX: char = '@';

/// Maker for XML decoders and encoders
#[derive(Debug, Clone)]
pub struct XmlCodec {
    root: String,
}

impl XmlCodec {
    /// Codec whose encoders wrap unnamed values in `root`
    pub fn with_root(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &str {
        &self.root
    }
}

impl Default for XmlCodec {
    fn default() -> Self {
        Self::with_root(DEFAULT_ROOT)
    }
}

impl DecoderMaker for XmlCodec {
    fn new_decoder<'a>(&self, reader: Box<dyn BufRead + 'a>) -> Box<dyn Decoder + 'a> {
        Box::new(XmlDecoder::new(reader))
    }
}

impl EncoderMaker for XmlCodec {
    fn new_encoder<'a>(&self, writer: Box<dyn Write + 'a>) -> Box<dyn Encoder + 'a> {
        Box::new(XmlEncoder::with_root(writer, self.root.clone()))
    }
}

/// Element under construction
struct Frame {
    name: String,
    attrs: Map<String, Value>,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attrs = Map::new();

        for attr in start.attributes() {
            let attr = attr.map_err(|e| CodecflowError::malformed(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref());
            let value = unescape_text(&String::from_utf8_lossy(&attr.value))?;
            attrs.insert(format!("{}{}", ATTR_PREFIX, key), Value::String(value));
        }

        Ok(Self {
            name,
            attrs,
            children: Map::new(),
            text: String::new(),
        })
    }

    fn push_child(&mut self, name: String, value: Value) {
        match self.children.get_mut(&name) {
            None => {
                self.children.insert(name, value);
            }
            // Child values are never arrays, so an array here is a repeated name
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
        }
    }

    fn close(self) -> (String, Value) {
        let text = self.text.trim();
        let value = if self.attrs.is_empty() && self.children.is_empty() {
            if text.is_empty() {
                Value::Null
            } else {
                Value::String(text.to_string())
            }
        } else {
            let mut obj = self.attrs;
            obj.extend(self.children);
            if !text.is_empty() {
                obj.insert(TEXT_KEY.to_string(), Value::String(text.to_string()));
            }
            Value::Object(obj)
        };
        (self.name, value)
    }
}

fn unescape_text(raw: &str) -> Result<String> {
    unescape(raw)
        .map(|s| s.into_owned())
        .map_err(|e| CodecflowError::malformed(e.to_string()))
}

fn named(name: String, value: Value) -> Value {
    let mut obj = Map::new();
    obj.insert(name, value);
    Value::Object(obj)
}

/// Streaming decoder reading one root element per call
pub struct XmlDecoder<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
}

impl<R: BufRead> XmlDecoder<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: Reader::from_reader(inner),
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Decoder for XmlDecoder<R> {
    fn decode(&mut self) -> Result<Value> {
        let mut stack: Vec<Frame> = Vec::new();

        loop {
            self.buf.clear();
            let closed = match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) => {
                    stack.push(Frame::open(&e)?);
                    None
                }
                Event::Empty(e) => Some(Frame::open(&e)?.close()),
                Event::End(_) => {
                    let frame = stack
                        .pop()
                        .ok_or_else(|| CodecflowError::malformed("closing tag without an open element"))?;
                    Some(frame.close())
                }
                Event::Text(e) => {
                    if let Some(frame) = stack.last_mut() {
                        let raw = String::from_utf8_lossy(e.as_ref());
                        frame.text.push_str(&unescape_text(&raw)?);
                    }
                    None
                }
                Event::CData(e) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                    }
                    None
                }
                Event::GeneralRef(e) => {
                    if let Some(frame) = stack.last_mut() {
                        let name = String::from_utf8_lossy(e.as_ref());
                        frame.text.push_str(&unescape_text(&format!("&{};", name))?);
                    }
                    None
                }
                Event::Eof => {
                    return match stack.last() {
                        None => Err(CodecflowError::EndOfStream),
                        Some(open) => Err(CodecflowError::malformed(format!(
                            "unexpected end of input inside <{}>",
                            open.name
                        ))),
                    };
                }
                _ => None,
            };

            if let Some((name, value)) = closed {
                match stack.last_mut() {
                    Some(parent) => parent.push_child(name, value),
                    None => return Ok(named(name, value)),
                }
            }
        }
    }
}

/// Encoder writing one root element per value
pub struct XmlEncoder<W: Write> {
    writer: Writer<W>,
    root: String,
}

impl<W: Write> XmlEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self::with_root(writer, DEFAULT_ROOT)
    }

    pub fn with_root(writer: W, root: impl Into<String>) -> Self {
        Self {
            writer: Writer::new(writer),
            root: root.into(),
        }
    }
}

impl<W: Write> Encoder for XmlEncoder<W> {
    fn encode(&mut self, value: &Value) -> Result<()> {
        let named_root = match value {
            Value::Object(map) if map.len() == 1 => map
                .iter()
                .next()
                .filter(|(name, _)| !name.starts_with(ATTR_PREFIX) && name.as_str() != TEXT_KEY),
            _ => None,
        };

        match named_root {
            Some((name, inner)) => write_element(&mut self.writer, name, inner)?,
            None => write_element(&mut self.writer, &self.root, value)?,
        }
        self.writer.get_mut().write_all(b"\n")?;
        Ok(())
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Reject keys that cannot be written as an XML name
///
/// Letters, `_` and `:` may start a name; digits, `-` and `.` may follow.
fn check_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_alphabetic() || first == '_' || first == ':')
                && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.'))
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(CodecflowError::malformed(format!("invalid XML name {:?}", name)))
    }
}

fn write_element<W: Write>(writer: &mut Writer<W>, name: &str, value: &Value) -> Result<()> {
    if !value.is_array() {
        check_name(name)?;
    }

    match value {
        Value::Null => {
            writer.write_event(Event::Empty(BytesStart::new(name)))?;
        }
        Value::Array(items) => {
            for item in items {
                write_element(writer, name, item)?;
            }
        }
        Value::Object(map) => {
            let mut start = BytesStart::new(name);
            let mut content = Vec::new();
            for (key, item) in map {
                match key.strip_prefix(ATTR_PREFIX) {
                    Some(attr) => {
                        check_name(attr)?;
                        start.push_attribute((attr, scalar_text(item).as_str()));
                    }
                    None => content.push((key, item)),
                }
            }

            if content.is_empty() {
                writer.write_event(Event::Empty(start))?;
                return Ok(());
            }

            writer.write_event(Event::Start(start))?;
            for (key, item) in content {
                if key == TEXT_KEY {
                    writer.write_event(Event::Text(BytesText::new(&scalar_text(item))))?;
                } else {
                    write_element(writer, key, item)?;
                }
            }
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
        scalar => {
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            writer.write_event(Event::Text(BytesText::new(&scalar_text(scalar))))?;
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
    }
    Ok(())
}
