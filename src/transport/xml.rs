//! XML reply normalization
//!
//! Some Commvault endpoints answer in XML regardless of the `Accept` header.
//! Such bodies are converted into the same JSON shape the session code reads:
//!
//! - the root element becomes a single top-level key
//! - attributes become `"@name"` keys with string values
//! - child elements are keyed by name, and a name seen more than once becomes
//!   an array in document order
//! - an element holding only text becomes that string; an empty element
//!   with no attributes becomes `null`
//! - text next to attributes or children is stored under `"#text"`
//!
//! Surrounding whitespace in text is trimmed and values are never coerced to
//! numbers, so `clientId="2"` reads back as `"@clientId": "2"`.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};

use crate::error::{CommvaultError, Result};

/// Key holding an element's text when it also has attributes or children
pub const TEXT_KEY: &str = "#text";

/// Prefix of keys holding attributes
pub const ATTRIBUTE_PREFIX: char = '@';

/// Whether a reply body looks like an XML document
#[must_use]
pub fn is_xml(body: &str) -> bool {
    body.trim_start_matches('\u{feff}').trim_start().starts_with('<')
}

/// Convert an XML document to JSON
///
/// # Errors
/// Returns `TransportFailure` (500) if the document is malformed or has no
/// root element
pub fn to_json(body: &str) -> Result<Value> {
    let mut reader = Reader::from_str(body.trim_start_matches('\u{feff}'));
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| invalid(format!("at byte {}: {e}", reader.buffer_position())))?;

        match event {
            Event::Start(start) => stack.push(Element::open(&start)?),
            Event::Empty(start) => {
                let element = Element::open(&start)?;
                close(element, &mut stack, &mut root)?;
            }
            Event::End(end) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| invalid("unexpected closing tag"))?;
                if element.name.as_bytes() != end.name().as_ref() {
                    return Err(invalid(format!(
                        "mismatched closing tag for <{}>",
                        element.name
                    )));
                }
                close(element, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| invalid(e.to_string()))?;
                push_text(&mut stack, &text);
            }
            Event::CData(data) => {
                let data = data.into_inner();
                push_text(&mut stack, &String::from_utf8_lossy(&data));
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(invalid(format!("unclosed element <{}>", open.name)));
    }
    let (name, value) = root.ok_or_else(|| invalid("no root element"))?;

    let mut document = Map::new();
    document.insert(name, value);
    Ok(Value::Object(document))
}

fn invalid(detail: impl std::fmt::Display) -> CommvaultError {
    CommvaultError::transport(format!("Invalid XML in response: {detail}"))
}

#[derive(Debug)]
struct Element {
    name: String,
    fields: Map<String, Value>,
    text: String,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut fields = Map::new();

        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| invalid(e.to_string()))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref());
            let value = attribute
                .unescape_value()
                .map_err(|e| invalid(e.to_string()))?;
            fields.insert(
                format!("{ATTRIBUTE_PREFIX}{key}"),
                Value::String(value.into_owned()),
            );
        }

        Ok(Self {
            name,
            fields,
            text: String::new(),
        })
    }

    fn into_value(self) -> Value {
        let text = self.text.trim();
        match (self.fields.is_empty(), text.is_empty()) {
            (true, true) => Value::Null,
            (true, false) => Value::String(text.to_string()),
            (false, _) => {
                let mut fields = self.fields;
                if !text.is_empty() {
                    fields.insert(TEXT_KEY.to_string(), Value::String(text.to_string()));
                }
                Value::Object(fields)
            }
        }
    }
}

fn push_text(stack: &mut [Element], text: &str) {
    // Text outside the root element is ignored
    if let Some(current) = stack.last_mut() {
        current.text.push_str(text);
    }
}

fn close(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<(String, Value)>,
) -> Result<()> {
    let name = element.name.clone();
    let value = element.into_value();

    match stack.last_mut() {
        Some(parent) => {
            insert_child(&mut parent.fields, name, value);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some((name, value));
            Ok(())
        }
        None => Err(invalid(format!("second root element <{name}>"))),
    }
}

fn insert_child(fields: &mut Map<String, Value>, name: String, value: Value) {
    match fields.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            fields.insert(name, value);
        }
    }
}
