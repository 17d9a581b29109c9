//! XML Node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references.

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Id of the document node; every document has one at index 0.
pub const DOCUMENT_NODE: NodeId = 0;

/// Type of XML node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Text content
    Text,
    /// CDATA section
    CData,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
}

/// An XML node in the arena
#[derive(Debug, Clone)]
pub struct XmlNode {
    /// Type of this node
    pub kind: NodeKind,
    /// Parent node (None for document root)
    pub parent: Option<NodeId>,
    /// First child node
    pub first_child: Option<NodeId>,
    /// Last child node
    pub last_child: Option<NodeId>,
    /// Previous sibling
    pub prev_sibling: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Index into string pool for name (elements, PIs) or text content (text,
    /// CDATA, comments)
    pub name_id: u32,
    /// Index into string pool for PI data, or 0
    pub value_id: u32,
    /// Attributes in insertion order (elements only)
    pub attributes: Vec<XmlAttribute>,
    /// Depth in document tree
    pub depth: u16,
}

impl XmlNode {
    fn with_kind(kind: NodeKind, parent: Option<NodeId>, depth: u16) -> Self {
        XmlNode {
            kind,
            parent,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id: 0,
            value_id: 0,
            attributes: Vec::new(),
            depth,
        }
    }

    /// Create a new document root node
    pub fn document() -> Self {
        Self::with_kind(NodeKind::Document, None, 0)
    }

    /// Create a new element node
    pub fn element(name_id: u32, parent: NodeId, depth: u16) -> Self {
        let mut node = Self::with_kind(NodeKind::Element, Some(parent), depth);
        node.name_id = name_id;
        node
    }

    /// Create a character-data node (text, CDATA or comment)
    pub fn character_data(kind: NodeKind, content_id: u32, parent: NodeId, depth: u16) -> Self {
        let mut node = Self::with_kind(kind, Some(parent), depth);
        node.name_id = content_id;
        node
    }

    /// Create a processing instruction node
    pub fn processing_instruction(target_id: u32, data_id: u32, parent: NodeId, depth: u16) -> Self {
        let mut node = Self::with_kind(NodeKind::ProcessingInstruction, Some(parent), depth);
        node.name_id = target_id;
        node.value_id = data_id;
        node
    }

    /// Check if this is an element node
    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }
}

/// Stored attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlAttribute {
    /// Index into string pool for attribute name
    pub name_id: u32,
    /// Index into string pool for attribute value
    pub value_id: u32,
}

impl XmlAttribute {
    pub fn new(name_id: u32, value_id: u32) -> Self {
        XmlAttribute { name_id, value_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let doc = XmlNode::document();
        assert_eq!(doc.kind, NodeKind::Document);
        assert!(doc.parent.is_none());
        assert_eq!(doc.depth, 0);
    }

    #[test]
    fn test_element_node() {
        let elem = XmlNode::element(1, 0, 1);
        assert_eq!(elem.kind, NodeKind::Element);
        assert_eq!(elem.parent, Some(0));
        assert_eq!(elem.name_id, 1);
        assert_eq!(elem.depth, 1);
        assert!(elem.attributes.is_empty());
    }

    #[test]
    fn test_cdata_node() {
        let cdata = XmlNode::character_data(NodeKind::CData, 3, 1, 2);
        assert_eq!(cdata.kind, NodeKind::CData);
        assert!(!cdata.is_element());
    }
}
