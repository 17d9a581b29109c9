//! DOM Module - Arena-based XML Document
//!
//! Implements a mutable, owned DOM representation using:
//! - Arena allocation for nodes
//! - NodeId (u32) indices for cache-friendly traversal
//! - String interning for element/attribute names and character data
//!
//! Node ids are handed out in document order, whichever way the tree was
//! built, so sorting ids sorts nodes.

pub mod document;
pub mod node;
pub mod serialize;
pub mod strings;

pub use document::{ParseOptions, XmlDocument};
pub use node::{NodeId, NodeKind, XmlAttribute, XmlNode, DOCUMENT_NODE};
pub use strings::StringPool;

use crate::error::Result;
use std::fmt;

/// Read-only view of a document, used by XPath evaluation and matching.
///
/// Implementors supply node lookup and the string pool; navigation and
/// naming are derived from those.
pub trait DocumentAccess {
    /// Get root element ID
    fn root_element_id(&self) -> Option<NodeId>;

    /// Get a node by ID
    fn get_node(&self, id: NodeId) -> Option<&XmlNode>;

    /// Get the string pool for direct access
    fn strings(&self) -> &StringPool;

    /// Id of the document node
    fn document_node_id(&self) -> NodeId {
        DOCUMENT_NODE
    }

    /// Kind of a node, if it exists
    fn node_kind_of(&self, id: NodeId) -> Option<NodeKind> {
        self.get_node(id).map(|n| n.kind)
    }

    /// Qualified name of an element or target of a processing instruction
    fn node_name(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Element | NodeKind::ProcessingInstruction => self.strings().get_str(node.name_id),
            _ => None,
        }
    }

    /// Get node local name (without prefix)
    fn node_local_name(&self, id: NodeId) -> Option<&str> {
        let name = self.node_name(id)?;
        Some(name.split_once(':').map_or(name, |(_, local)| local))
    }

    /// Character data of a text, CDATA or comment node, or the data of a
    /// processing instruction
    fn text_content(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Text | NodeKind::CData | NodeKind::Comment => self.strings().get_str(node.name_id),
            NodeKind::ProcessingInstruction => self.strings().get_str(node.value_id),
            _ => None,
        }
    }

    /// Get attributes for an element
    fn attributes(&self, id: NodeId) -> &[XmlAttribute] {
        match self.get_node(id) {
            Some(node) => &node.attributes,
            None => &[],
        }
    }

    /// Get attribute value by name
    fn get_attribute(&self, node_id: NodeId, name: &str) -> Option<&str> {
        let name_id = self.strings().lookup(name)?;
        let attr = self.attributes(node_id).iter().find(|a| a.name_id == name_id)?;
        self.strings().get_str(attr.value_id)
    }

    /// Get all attribute names and values
    fn get_attribute_values(&self, node_id: NodeId) -> Vec<(&str, &str)> {
        self.attributes(node_id)
            .iter()
            .filter_map(|attr| {
                let name = self.strings().get_str(attr.name_id)?;
                let value = self.strings().get_str(attr.value_id)?;
                Some((name, value))
            })
            .collect()
    }

    fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.parent
    }

    fn first_child_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.first_child
    }

    fn next_sibling_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.next_sibling
    }

    fn prev_sibling_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.prev_sibling
    }

    /// Children in document order
    fn children_vec(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut child = self.first_child_of(id);
        while let Some(child_id) = child {
            result.push(child_id);
            child = self.next_sibling_of(child_id);
        }
        result
    }

    /// Descendants in document order (excluding `id` itself)
    fn descendants_vec(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut child = self.get_node(id).and_then(|n| n.last_child);
        while let Some(child_id) = child {
            stack.push(child_id);
            child = self.prev_sibling_of(child_id);
        }

        while let Some(current) = stack.pop() {
            result.push(current);
            let mut child = self.get_node(current).and_then(|n| n.last_child);
            while let Some(child_id) = child {
                stack.push(child_id);
                child = self.prev_sibling_of(child_id);
            }
        }
        result
    }
}

/// XPath string-value of a node: concatenated descendant text for elements
/// and the document, own character data for everything else
pub fn node_string_value<D: DocumentAccess + ?Sized>(doc: &D, id: NodeId) -> String {
    match doc.node_kind_of(id) {
        Some(NodeKind::Element | NodeKind::Document) => {
            let mut result = String::new();
            for desc in doc.descendants_vec(id) {
                if matches!(doc.node_kind_of(desc), Some(NodeKind::Text | NodeKind::CData)) {
                    if let Some(text) = doc.text_content(desc) {
                        result.push_str(text);
                    }
                }
            }
            result
        }
        Some(_) => doc.text_content(id).unwrap_or("").to_string(),
        None => String::new(),
    }
}

/// Borrowed handle to one node of a document
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a XmlDocument,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(doc: &'a XmlDocument, id: NodeId) -> Self {
        NodeRef { doc, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'a XmlDocument {
        self.doc
    }

    pub fn kind(&self) -> NodeKind {
        self.doc.node_kind_of(self.id).unwrap_or(NodeKind::Document)
    }

    pub fn is_element(&self) -> bool {
        self.kind() == NodeKind::Element
    }

    /// Tag name for elements, target for processing instructions
    pub fn name(&self) -> Option<&'a str> {
        self.doc.node_name(self.id)
    }

    pub fn local_name(&self) -> Option<&'a str> {
        self.doc.node_local_name(self.id)
    }

    /// String-value of the node (all descendant text for elements)
    pub fn text(&self) -> String {
        node_string_value(self.doc, self.id)
    }

    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.doc.get_attribute(self.id, name)
    }

    /// Attributes in insertion order
    pub fn attributes(&self) -> Vec<(&'a str, &'a str)> {
        self.doc.get_attribute_values(self.id)
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.doc.parent_of(self.id).map(|id| NodeRef::new(self.doc, id))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let doc = self.doc;
        doc.children(self.id).map(move |id| NodeRef::new(doc, id))
    }

    /// Serialize this node and its subtree, without an XML declaration
    pub fn to_xml(&self) -> Result<String> {
        serialize::serialize_node(self.doc, self.id)
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("name", &self.name())
            .finish()
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}
