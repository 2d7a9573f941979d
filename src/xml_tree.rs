//! Generic XML-to-mapping conversion.
//!
//! The provider's responses are turned into a loose tree of [`Node`]s before
//! any typed model is built:
//!
//! - attributes become `@name` entries,
//! - the text of an element that also has attributes or children lives under `#text`,
//! - an element holding only text collapses to [`Node::Text`],
//! - an empty element becomes [`Node::Null`],
//! - repeated sibling elements are gathered into a [`Node::List`].
//!
//! Entry order follows document order.

use crate::error::{Result, ZillowError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

pub const TEXT_KEY: &str = "#text";

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Text(String),
    Map(Vec<(String, Node)>),
    List(Vec<Node>),
}

impl Node {
    /// Entry `key` of a mapping, including empty (`Null`) entries.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Like [`Node::get`], but an empty element counts as absent.
    pub fn child(&self, key: &str) -> Option<&Node> {
        self.get(key).filter(|node| !node.is_null())
    }

    /// Follow `keys` through nested mappings.
    pub fn path(&self, keys: &[&str]) -> Option<&Node> {
        keys.iter().try_fold(self, |node, key| node.child(key))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Node::Map(_))
    }

    /// Text payload of a leaf, or the `#text` entry of a mapping.
    pub fn text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(text),
            Node::Map(_) => self.get(TEXT_KEY).and_then(Node::text),
            _ => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            Node::Map(entries) => entries
                .iter()
                .find(|(k, _)| k.strip_prefix('@') == Some(name))
                .and_then(|(_, v)| v.text()),
            _ => None,
        }
    }

    /// Non-empty text of child `key`.
    pub fn child_text(&self, key: &str) -> Option<&str> {
        self.child(key)
            .and_then(Node::text)
            .filter(|text| !text.is_empty())
    }

    /// Child `key` read as a number. Thousands separators are ignored; a
    /// value that still cannot be read is logged and left out.
    pub fn number_child<T: FromStr>(&self, key: &str) -> Option<T> {
        self.child_text(key).and_then(|text| parse_number(key, text))
    }

    /// A single element and a list of elements both come back as a sequence.
    /// An empty element is still one item.
    pub fn items(&self) -> Vec<&Node> {
        match self {
            Node::List(items) => items.iter().collect(),
            other => vec![other],
        }
    }

    /// The first element of a list, or the node itself.
    pub fn first(&self) -> Option<&Node> {
        match self {
            Node::List(items) => items.first(),
            Node::Null => None,
            other => Some(other),
        }
    }

    pub fn to_json(&self) -> Value {
        Value::from(self)
    }
}

pub(crate) fn parse_number<T: FromStr>(key: &str, text: &str) -> Option<T> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    match cleaned.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = text, "unreadable number, leaving it unset");
            None
        }
    }
}

impl From<&Node> for Value {
    fn from(node: &Node) -> Self {
        match node {
            Node::Null => Value::Null,
            Node::Text(text) => Value::String(text.clone()),
            Node::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect::<Map<String, Value>>(),
            ),
            Node::List(items) => Value::Array(items.iter().map(Value::from).collect()),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

// Element being assembled while its end tag has not been seen yet
struct Frame {
    name: String,
    entries: Vec<(String, Node)>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Self> {
        let mut entries = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(xml_error)?;
            let key = format!("@{}", String::from_utf8_lossy(attr.key.as_ref()));
            let value = attr
                .decode_and_unescape_value(reader.decoder())
                .map_err(xml_error)?;
            entries.push((key, Node::Text(value.into_owned())));
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            entries,
            text: String::new(),
        })
    }

    fn close(self) -> (String, Node) {
        let text = self.text.trim();
        let node = if self.entries.is_empty() {
            if text.is_empty() {
                Node::Null
            } else {
                Node::Text(text.to_string())
            }
        } else {
            let mut entries = self.entries;
            if !text.is_empty() {
                entries.push((TEXT_KEY.to_string(), Node::Text(text.to_string())));
            }
            Node::Map(entries)
        };
        (self.name, node)
    }

    fn add_child(&mut self, name: String, node: Node) {
        insert_entry(&mut self.entries, name, node);
    }
}

fn insert_entry(entries: &mut Vec<(String, Node)>, name: String, node: Node) {
    match entries.iter_mut().find(|(k, _)| *k == name) {
        Some((_, Node::List(items))) => items.push(node),
        Some((_, existing)) => {
            let previous = std::mem::replace(existing, Node::Null);
            *existing = Node::List(vec![previous, node]);
        }
        None => entries.push((name, node)),
    }
}

fn xml_error(err: impl fmt::Display) -> ZillowError {
    ZillowError::Xml(err.to_string())
}

fn predefined_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        _ => None,
    }
}

/// Parse an XML document into a [`Node`] tree rooted at a one-entry mapping
/// keyed by the root element's (prefixed) name.
pub fn parse(xml: &str) -> Result<Node> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Vec<(String, Node)> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let frame = Frame::open(&e, &reader)?;
                stack.push(frame);
            }
            Ok(Event::Empty(e)) => {
                let (name, node) = Frame::open(&e, &reader)?.close();
                attach(&mut stack, &mut root, name, node);
            }
            Ok(Event::End(_)) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| ZillowError::Xml("unexpected closing tag".to_string()))?;
                let (name, node) = frame.close();
                attach(&mut stack, &mut root, name, node);
            }
            Ok(Event::Text(e)) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&e.decode().map_err(xml_error)?);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if let Some(frame) = stack.last_mut() {
                    if let Some(ch) = e.resolve_char_ref().map_err(xml_error)? {
                        frame.text.push(ch);
                    } else {
                        let name = e.decode().map_err(xml_error)?;
                        match predefined_entity(&name) {
                            Some(ch) => frame.text.push(ch),
                            None => return Err(ZillowError::Xml(format!("unknown entity &{};", name))),
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ZillowError::Xml(format!(
                    "error at position {}: {}",
                    reader.error_position(),
                    e
                )))
            }
            // Declarations, comments, processing instructions and doctypes carry no data
            _ => (),
        }
    }

    if let Some(frame) = stack.last() {
        return Err(ZillowError::Xml(format!("unclosed element <{}>", frame.name)));
    }
    if root.is_empty() {
        return Err(ZillowError::Xml("document has no root element".to_string()));
    }

    Ok(Node::Map(root))
}

fn attach(stack: &mut [Frame], root: &mut Vec<(String, Node)>, name: String, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.add_child(name, node),
        None => insert_entry(root, name, node),
    }
}
