//! Property-list tree loading and key lookup
//!
//! iPhoto stores its catalog as an XML property list where a `<dict>` is a
//! flat run of `<key>` elements, each followed by its value element:
//!
//! ```xml
//! <dict>
//!     <key>RollName</key>
//!     <string>Summer Party</string>
//! </dict>
//! ```
//!
//! The document is read once into a tree of [`Node`]s holding only element
//! children. While each node is closed, its `<key>` children are paired with
//! the element that follows them, so [`Node::value_for_key`] is a hash lookup
//! rather than a sibling walk.

use crate::error::{Error, Result};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Element name of dictionary keys
pub const KEY: &str = "key";
/// Element name of dictionaries
pub const DICT: &str = "dict";
/// Element name of arrays
pub const ARRAY: &str = "array";
/// Element name of strings
pub const STRING: &str = "string";

/// An element of the property-list document
#[derive(Debug, Clone, Default)]
pub struct Node {
    name: String,
    text: String,
    children: Vec<Node>,
    /// Key text to the position of the element following that key.
    /// `None` marks a key that is the last element child.
    keys: HashMap<String, Option<usize>>,
}

impl Node {
    fn new(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// Pair every `<key>` child with its following element sibling.
    /// The first occurrence of a duplicated key wins.
    fn index_keys(&mut self) {
        let len = self.children.len();
        for (i, child) in self.children.iter().enumerate() {
            if child.name == KEY {
                let value = (i + 1 < len).then_some(i + 1);
                self.keys.entry(child.text.clone()).or_insert(value);
            }
        }
    }

    /// Element name (`dict`, `array`, `key`, `string`, ...)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this element has the given name
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Text content of the element, entities unescaped
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Element children in document order
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Element children with the given name, in document order
    pub fn element_children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Position among [`Node::children`] of the value paired with `key`
    pub fn value_position(&self, key: &str) -> Result<usize> {
        match self.keys.get(key) {
            Some(Some(position)) => Ok(*position),
            Some(None) => Err(Error::MalformedPair {
                key: key.to_string(),
            }),
            None => Err(Error::KeyNotFound {
                key: key.to_string(),
            }),
        }
    }

    /// Value element paired with `key` in this dictionary
    pub fn value_for_key(&self, key: &str) -> Result<&Node> {
        let position = self.value_position(key)?;
        Ok(&self.children[position])
    }

    /// Like [`Node::value_for_key`], but the value must be a `name` element
    pub fn typed_value_for_key(&self, key: &str, name: &'static str) -> Result<&Node> {
        let value = self.value_for_key(key)?;
        if value.is(name) {
            Ok(value)
        } else {
            Err(Error::UnexpectedNode {
                key: key.to_string(),
                expected: name,
                found: value.name.clone(),
            })
        }
    }

    /// Number of keys in this dictionary
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }
}

/// Value element paired with `key` in `dict`
pub fn value_for_key<'a>(key: &str, dict: &'a Node) -> Result<&'a Node> {
    dict.value_for_key(key)
}

/// A parsed property-list document
#[derive(Debug, Clone)]
pub struct Document {
    root: Node,
}

impl Document {
    /// Read and parse the catalog at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::CatalogLoad {
            path: path.to_path_buf(),
            source: e,
        })?;

        let document = parse_tree(&content, path)?;
        debug!(
            ?path,
            bytes = content.len(),
            root_keys = document.root.key_count(),
            "Parsed property list"
        );
        Ok(document)
    }

    /// Parse a property list held in memory
    pub fn parse(xml: &str) -> Result<Self> {
        parse_tree(xml, Path::new("<memory>"))
    }

    /// The top-level dictionary
    pub fn root(&self) -> &Node {
        &self.root
    }
}

fn parse_error(path: &Path, message: impl Into<String>) -> Error {
    Error::CatalogParse {
        path: PathBuf::from(path),
        message: message.into(),
    }
}

fn parse_tree(xml: &str, path: &Path) -> Result<Document> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Node> = Vec::new();
    let mut document_element: Option<Node> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            parse_error(
                path,
                format!("{} at byte {}", e, reader.error_position()),
            )
        })?;

        match event {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                stack.push(Node::new(name));
            }
            Event::Empty(empty) => {
                let name = String::from_utf8_lossy(empty.name().as_ref()).into_owned();
                attach(Node::new(name), &mut stack, &mut document_element);
            }
            Event::End(_) => {
                let mut node = stack
                    .pop()
                    .ok_or_else(|| parse_error(path, "closing tag without an open element"))?;
                node.index_keys();
                attach(node, &mut stack, &mut document_element);
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    let unescaped = text
                        .unescape()
                        .map_err(|e| parse_error(path, e.to_string()))?;
                    current.text.push_str(&unescaped);
                }
            }
            Event::CData(cdata) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&cdata));
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and DOCTYPE
            // carry nothing the catalog needs.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(parse_error(
            path,
            format!("unexpected end of document inside <{}>", open.name),
        ));
    }

    let document_element =
        document_element.ok_or_else(|| parse_error(path, "document has no root element"))?;

    let root = if document_element.is(DICT) {
        document_element
    } else {
        document_element
            .children
            .into_iter()
            .find(|child| child.is(DICT))
            .ok_or_else(|| parse_error(path, "no top-level <dict> in document"))?
    };

    Ok(Document { root })
}

fn attach(node: Node, stack: &mut [Node], document_element: &mut Option<Node>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if document_element.is_none() => *document_element = Some(node),
        None => trace!(name = %node.name, "Ignoring element after the document element"),
    }
}
