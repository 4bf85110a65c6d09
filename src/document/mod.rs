//! XML response documents.
//!
//! Parsing is a pluggable capability: the lifecycle only decides *whether* to
//! attempt it and keeps whatever the [`DocumentParser`] returns. The default
//! [`XmlParser`] is backed by `roxmltree` and copies the parsed tree into an
//! owned [`XmlDocument`] so it can outlive the response text.

use crate::error_handling::DocumentError;

/// Turns response text into a structured document.
pub trait DocumentParser {
    /// Parses `text`.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentError`] if the text cannot be parsed. Callers in
    /// this crate treat that as "no document", never as a failed exchange.
    fn parse(&self, text: &str) -> Result<XmlDocument, DocumentError>;
}

/// Default parser: well-formed XML via `roxmltree`.
///
/// Document type declarations are accepted, so XHTML bodies starting with
/// `<!DOCTYPE html>` parse like any other XML.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlParser;

impl DocumentParser for XmlParser {
    fn parse(&self, text: &str) -> Result<XmlDocument, DocumentError> {
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        };
        let parsed = roxmltree::Document::parse_with_options(text, options)?;
        Ok(XmlDocument {
            root: XmlElement::from_node(parsed.root_element()),
        })
    }
}

/// A parsed response document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    /// Creates a document from an already-built root element.
    pub fn new(root: XmlElement) -> Self {
        Self { root }
    }

    /// The document element.
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// First element named `name` in document order, including the root.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        if self.root.name == name {
            return Some(&self.root);
        }
        self.root.find(name)
    }
}

/// A node in an [`XmlDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    /// Child element
    Element(XmlElement),
    /// Character data
    Text(String),
}

/// An element with its attributes and children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    name: String,
    namespace: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    /// Creates an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn from_node(node: roxmltree::Node<'_, '_>) -> Self {
        let attributes = node
            .attributes()
            .map(|attr| (attr.name().to_string(), attr.value().to_string()))
            .collect();
        let children = node
            .children()
            .filter_map(|child| {
                if child.is_element() {
                    Some(XmlNode::Element(Self::from_node(child)))
                } else if child.is_text() {
                    child.text().map(|text| XmlNode::Text(text.to_string()))
                } else {
                    None
                }
            })
            .collect();

        Self {
            name: node.tag_name().name().to_string(),
            namespace: node.tag_name().namespace().map(str::to_string),
            attributes,
            children,
        }
    }

    /// Local name of the element.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace URI, if the element has one.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Value of the attribute named `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Direct children in document order.
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Direct child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// Concatenated character data of this element and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(element) => element.collect_text(out),
            }
        }
    }

    /// First descendant element named `name`, depth first.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        for element in self.elements() {
            if element.name == name {
                return Some(element);
            }
            if let Some(found) = element.find(name) {
                return Some(found);
            }
        }
        None
    }
}
