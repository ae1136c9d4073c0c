//! Response-body decoding (JSON or XML) into a `serde_json::Value`.
//!
//! XML is mapped the way feed consumers expect it:
//! - child elements become object keys, repeated children become arrays
//! - attributes become `@name` keys
//! - a leaf element becomes its text (or `null` when empty)
//! - text next to children/attributes is kept under `#text`
//! - the root element stays as a single-key object

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::error::FeedError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Undecoded response as handed over by a fetcher.
#[derive(Debug, Clone, Default)]
pub struct RawBody {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl RawBody {
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: Option<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Json,
    Xml,
}

/// Pick the format from the content type, falling back to sniffing the
/// first non-whitespace byte.
pub fn detect_format(body: &RawBody) -> BodyFormat {
    if let Some(ct) = body.content_type.as_deref() {
        let ct = ct.to_ascii_lowercase();
        if ct.contains("json") {
            return BodyFormat::Json;
        }
        if ct.contains("xml") {
            return BodyFormat::Xml;
        }
    }

    let bytes = body.bytes.strip_prefix(UTF8_BOM).unwrap_or(&body.bytes);
    match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'<') => BodyFormat::Xml,
        _ => BodyFormat::Json,
    }
}

/// Decode a fetched body. Malformed content is a [`FeedError::Parse`].
pub fn decode(url: &str, body: &RawBody) -> Result<Value, FeedError> {
    let text = body_text(&body.bytes);
    let parsed = match detect_format(body) {
        BodyFormat::Json => serde_json::from_str(&text).map_err(|e| e.to_string()),
        BodyFormat::Xml => xml_to_value(&text),
    };
    parsed.map_err(|message| FeedError::Parse {
        url: url.to_string(),
        message: format!("{message} (body: {})", snippet(&text)),
    })
}

/// UTF-8 with BOM stripped; feeds that are not UTF-8 are read as Latin-1.
fn body_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn snippet(text: &str) -> &str {
    let end = text
        .char_indices()
        .nth(200)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[..end]
}

// ---------------------------------------------------------------------------
// XML → JSON
// ---------------------------------------------------------------------------

struct Element {
    name: String,
    fields: Map<String, Value>,
    text: String,
}

impl Element {
    fn document() -> Self {
        Self {
            name: String::new(),
            fields: Map::new(),
            text: String::new(),
        }
    }

    fn open(start: &BytesStart<'_>) -> Result<Self, String> {
        let mut fields = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| format!("bad attribute: {e}"))?;
            let key = format!("@{}", String::from_utf8_lossy(attr.key.as_ref()));
            let value = String::from_utf8_lossy(&attr.value).to_string();
            fields.insert(key, Value::String(value));
        }
        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).to_string(),
            fields,
            text: String::new(),
        })
    }

    fn attach(&mut self, name: String, value: Value) {
        match self.fields.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.fields.insert(name, value);
            }
        }
    }

    fn finish(self) -> (String, Value) {
        let text = self.text.trim();
        let value = if self.fields.is_empty() {
            if text.is_empty() {
                Value::Null
            } else {
                Value::String(text.to_string())
            }
        } else {
            let mut fields = self.fields;
            if !text.is_empty() {
                fields.insert("#text".to_string(), Value::String(text.to_string()));
            }
            Value::Object(fields)
        };
        (self.name, value)
    }
}

/// Convert an XML document into a JSON value.
pub fn xml_to_value(text: &str) -> Result<Value, String> {
    let mut reader = Reader::from_str(text);
    let mut stack = vec![Element::document()];

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => stack.push(Element::open(e)?),
            Ok(Event::Empty(ref e)) => {
                let (name, value) = Element::open(e)?.finish();
                current(&mut stack)?.attach(name, value);
            }
            Ok(Event::End(_)) => {
                if stack.len() < 2 {
                    return Err("unexpected closing tag".to_string());
                }
                let (name, value) = stack.pop().map(Element::finish).unwrap_or_default();
                current(&mut stack)?.attach(name, value);
            }
            Ok(Event::Text(ref e)) => {
                current(&mut stack)?
                    .text
                    .push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Ok(Event::CData(e)) => {
                let part = String::from_utf8_lossy(&e.into_inner()).to_string();
                current(&mut stack)?.text.push_str(&part);
            }
            Ok(Event::GeneralRef(ref e)) => {
                let name = String::from_utf8_lossy(e.as_ref()).to_string();
                current(&mut stack)?.text.push_str(&resolve_entity(&name));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("XML parse error: {e}")),
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err("unclosed element at end of document".to_string());
    }
    let document = stack.pop().map(|d| d.fields).unwrap_or_default();
    if document.is_empty() {
        return Err("no root element".to_string());
    }
    Ok(Value::Object(document))
}

fn current(stack: &mut [Element]) -> Result<&mut Element, String> {
    stack
        .last_mut()
        .ok_or_else(|| "element stack underflow".to_string())
}

fn resolve_entity(name: &str) -> String {
    if let Some(code) = name.strip_prefix('#') {
        let parsed = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        if let Some(ch) = parsed.and_then(char::from_u32) {
            return ch.to_string();
        }
    } else if let Some(resolved) = quick_xml::escape::resolve_predefined_entity(name) {
        return resolved.to_string();
    }
    format!("&{name};")
}
