//! Fluent XML builder
//!
//! A cursor walks a growing [`XmlDocument`]: `child` appends an element under
//! the cursor and steps into it, `to_parent` and `to_ancestor` step back out.
//!
//! ```
//! use xmlstructure::XmlBuilder;
//!
//! let mut xml = XmlBuilder::new();
//! xml.child("users")
//!     .child("user")
//!     .child("email")
//!     .set_value("davert@mail.ua")
//!     .set_attribute("valid", "true")?
//!     .to_ancestor("users")?;
//!
//! assert_eq!(
//!     xml.serialize()?,
//!     "<?xml version=\"1.0\"?>\n<users><user><email valid=\"true\">davert@mail.ua</email></user></users>\n"
//! );
//! # Ok::<(), xmlstructure::Error>(())
//! ```

use std::fmt;

use log::{trace, warn};

use crate::dom::{DocumentAccess, NodeId, NodeKind, NodeRef, XmlDocument, DOCUMENT_NODE};
use crate::error::{Error, Result};

/// Builds a document by moving a cursor through it.
///
/// The cursor always refers to a node of the builder's own document; it
/// starts on the document node. Nodes are only ever appended.
#[derive(Debug, Clone)]
pub struct XmlBuilder {
    doc: XmlDocument,
    cursor: NodeId,
}

impl Default for XmlBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlBuilder {
    pub fn new() -> Self {
        XmlBuilder {
            doc: XmlDocument::new(),
            cursor: DOCUMENT_NODE,
        }
    }

    /// Append a `<tag>` element under the cursor and move into it.
    ///
    /// Appending at the document node after the root already exists still
    /// succeeds, but the document then has two top-level elements and
    /// [`serialize`](Self::serialize) rejects it.
    pub fn child(&mut self, tag: &str) -> &mut Self {
        let id = self.doc.append_element(self.cursor, tag);
        trace!(target: "xmlstructure::builder", "child <{}>: cursor {} -> {}", tag, self.cursor, id);
        self.cursor = id;
        self
    }

    /// Replace the text value of the cursor node.
    ///
    /// The document node cannot carry text, so there the call is logged and
    /// ignored.
    pub fn set_value(&mut self, text: &str) -> &mut Self {
        if self.cursor == DOCUMENT_NODE {
            warn!(target: "xmlstructure::builder", "set_value({:?}) on the document node ignored", text);
            return self;
        }
        if let Err(err) = self.doc.set_text_value(self.cursor, text) {
            warn!(target: "xmlstructure::builder", "set_value on node {} failed: {}", self.cursor, err);
        }
        self
    }

    /// Set an attribute on the cursor element; fails with
    /// [`Error::InvalidOperation`] anywhere else
    pub fn set_attribute(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        self.doc.set_attribute(self.cursor, name, value)?;
        Ok(self)
    }

    /// Move the cursor to its parent
    pub fn to_parent(&mut self) -> Result<&mut Self> {
        let parent = self.doc.parent_of(self.cursor).ok_or(Error::NoParent)?;
        trace!(target: "xmlstructure::builder", "to_parent: cursor {} -> {}", self.cursor, parent);
        self.cursor = parent;
        Ok(self)
    }

    /// Move the cursor to the nearest strict ancestor element named `tag`.
    ///
    /// On failure the cursor stays where it was.
    pub fn to_ancestor(&mut self, tag: &str) -> Result<&mut Self> {
        let mut current = self.cursor;
        while let Some(parent) = self.doc.parent_of(current) {
            if self.doc.node_kind_of(parent) == Some(NodeKind::Element) && self.doc.node_name(parent) == Some(tag) {
                trace!(target: "xmlstructure::builder", "to_ancestor <{}>: cursor {} -> {}", tag, self.cursor, parent);
                self.cursor = parent;
                return Ok(self);
            }
            current = parent;
        }
        Err(Error::AncestorNotFound(tag.to_string()))
    }

    /// The whole document as XML text, declaration included.
    ///
    /// Fails with [`Error::SerializationFailed`] for an invalid name or a
    /// second top-level element.
    pub fn serialize(&self) -> Result<String> {
        self.doc.to_xml()
    }

    pub fn document(&self) -> &XmlDocument {
        &self.doc
    }

    pub fn into_document(self) -> XmlDocument {
        self.doc
    }

    /// The node the cursor refers to
    pub fn cursor(&self) -> NodeRef<'_> {
        NodeRef::new(&self.doc, self.cursor)
    }
}

impl fmt::Display for XmlBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let xml = self.serialize().map_err(|_| fmt::Error)?;
        f.write_str(&xml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_starts_at_document() {
        let xml = XmlBuilder::new();
        assert_eq!(xml.cursor().kind(), NodeKind::Document);
        assert!(xml.document().is_empty());
    }

    #[test]
    fn test_child_moves_cursor() {
        let mut xml = XmlBuilder::new();
        xml.child("a").child("b");
        assert_eq!(xml.cursor().name(), Some("b"));
        assert_eq!(xml.cursor().parent().unwrap().name(), Some("a"));
        assert_eq!(xml.document().root().unwrap().name(), Some("a"));
    }

    #[test]
    fn test_set_value_replaces_previous_value() {
        let mut xml = XmlBuilder::new();
        xml.child("a").set_value("one").set_value("two");
        assert_eq!(xml.cursor().text(), "two");
        assert_eq!(xml.serialize().unwrap(), "<?xml version=\"1.0\"?>\n<a>two</a>\n");
    }

    #[test]
    fn test_set_value_on_document_is_ignored() {
        let mut xml = XmlBuilder::new();
        xml.set_value("stray");
        assert_eq!(xml.document().node_count(), 1);
    }

    #[test]
    fn test_set_attribute_requires_element() {
        let mut xml = XmlBuilder::new();
        assert_eq!(xml.set_attribute("x", "1").err(), Some(Error::InvalidOperation));

        xml.child("a");
        xml.set_attribute("x", "1").unwrap().set_attribute("x", "2").unwrap();
        assert_eq!(xml.cursor().attribute("x"), Some("2"));
        assert_eq!(xml.cursor().attributes().len(), 1);
    }

    #[test]
    fn test_to_parent() {
        let mut xml = XmlBuilder::new();
        assert_eq!(xml.to_parent().err(), Some(Error::NoParent));

        xml.child("a").child("b");
        xml.to_parent().unwrap();
        assert_eq!(xml.cursor().name(), Some("a"));
        xml.to_parent().unwrap();
        assert_eq!(xml.cursor().kind(), NodeKind::Document);
        assert_eq!(xml.to_parent().err(), Some(Error::NoParent));
    }

    #[test]
    fn test_to_ancestor_skips_current_node() {
        let mut xml = XmlBuilder::new();
        xml.child("a").child("a").child("b");
        let outer = xml.document().root().unwrap().id();

        xml.to_ancestor("a").unwrap();
        assert_ne!(xml.cursor().id(), outer);

        xml.to_ancestor("a").unwrap();
        assert_eq!(xml.cursor().id(), outer);

        let before = xml.cursor().id();
        assert_eq!(xml.to_ancestor("a").err(), Some(Error::AncestorNotFound("a".to_string())));
        assert_eq!(xml.cursor().id(), before);
    }

    #[test]
    fn test_siblings_after_to_parent() {
        let mut xml = XmlBuilder::new();
        xml.child("list")
            .child("item")
            .set_value("1")
            .to_parent()
            .unwrap()
            .child("item")
            .set_value("2");
        assert_eq!(
            xml.to_string(),
            "<?xml version=\"1.0\"?>\n<list><item>1</item><item>2</item></list>\n"
        );
    }

    #[test]
    fn test_second_root_fails_serialization() {
        let mut xml = XmlBuilder::new();
        xml.child("a").to_parent().unwrap().child("b");
        assert!(matches!(xml.serialize(), Err(Error::SerializationFailed(_))));
    }

    #[test]
    fn test_invalid_tag_fails_serialization() {
        let mut xml = XmlBuilder::new();
        xml.child("not valid");
        assert!(matches!(xml.serialize(), Err(Error::SerializationFailed(_))));
    }
}
