//! XML Document - Arena-based DOM representation
//!
//! Owned, growable DOM storage with:
//! - Arena allocation for nodes
//! - NodeId indices for traversal
//! - String interning for names, values and character data
//!
//! Nodes are only ever appended, never removed or moved.

use super::node::{NodeId, NodeKind, XmlAttribute, XmlNode, DOCUMENT_NODE};
use super::strings::StringPool;
use super::{serialize, DocumentAccess, NodeRef};
use crate::error::{Error, Result};
use crate::reader::events::{StartElement, XmlEvent};
use crate::reader::slice::SliceReader;

/// Options controlling how XML text is turned into a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Fail on any well-formedness violation instead of recovering
    pub strict: bool,
    /// Keep text nodes that consist of whitespace only
    pub preserve_whitespace: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            strict: true,
            preserve_whitespace: false,
        }
    }
}

impl ParseOptions {
    /// Recovering parser that still drops indentation
    pub fn lenient() -> Self {
        ParseOptions {
            strict: false,
            ..Self::default()
        }
    }
}

/// An XML document stored in arena format
#[derive(Debug, Clone)]
pub struct XmlDocument {
    /// Arena of nodes; index 0 is the document node
    nodes: Vec<XmlNode>,
    /// Interned strings
    strings: StringPool,
    /// Root element node ID (not document node)
    root_element: Option<NodeId>,
    version: Option<String>,
    encoding: Option<String>,
    standalone: Option<bool>,
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlDocument {
    /// Create a document holding only the document node
    pub fn new() -> Self {
        XmlDocument {
            nodes: vec![XmlNode::document()],
            strings: StringPool::new(),
            root_element: None,
            version: None,
            encoding: None,
            standalone: None,
        }
    }

    /// Parse XML text with the default (strict) options
    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_with_options(input, ParseOptions::default())
    }

    /// Parse XML text. Empty or whitespace-only input yields an empty document.
    pub fn parse_with_options(input: &str, options: ParseOptions) -> Result<Self> {
        let mut doc = Self::new();
        if input.trim().is_empty() {
            return Ok(doc);
        }

        let reader = if options.strict {
            SliceReader::new_strict(input.as_bytes())
        } else {
            SliceReader::new(input.as_bytes())
        };
        doc.build_from_events(reader, options)?;

        log::trace!(
            target: "xmlstructure::dom",
            "parsed {} bytes into {} nodes",
            input.len(),
            doc.nodes.len()
        );
        Ok(doc)
    }

    /// Build the arena from reader events
    fn build_from_events(&mut self, mut reader: SliceReader<'_>, options: ParseOptions) -> Result<()> {
        let strict = options.strict;
        // Open elements; the document node is always at the bottom
        let mut stack: Vec<NodeId> = vec![DOCUMENT_NODE];

        while let Some(event) = reader.next_event() {
            let offset = reader.position();
            let parent_id = *stack.last().unwrap_or(&DOCUMENT_NODE);
            let at_top_level = stack.len() == 1;

            match event {
                XmlEvent::StartElement(elem) | XmlEvent::EmptyElement(elem)
                    if strict && at_top_level && self.root_element.is_some() =>
                {
                    let name = String::from_utf8_lossy(&elem.name);
                    return Err(Error::parse(format!("Multiple root elements: <{}>", name), offset));
                }

                XmlEvent::StartElement(elem) => {
                    let node_id = self.append_parsed_element(parent_id, &elem);
                    stack.push(node_id);
                }

                XmlEvent::EmptyElement(elem) => {
                    self.append_parsed_element(parent_id, &elem);
                }

                XmlEvent::EndElement(end) => {
                    let name = end.name_str().unwrap_or("");
                    let open = stack
                        .iter()
                        .rposition(|&id| id != DOCUMENT_NODE && self.node_name(id) == Some(name));

                    match open {
                        Some(pos) if pos == stack.len() - 1 => {
                            stack.pop();
                        }
                        Some(pos) if !strict => stack.truncate(pos),
                        None if !strict => {}
                        _ => {
                            let expected = self.node_name(parent_id).unwrap_or("");
                            let message = if at_top_level {
                                format!("Unexpected end tag </{}>", name)
                            } else {
                                format!("Mismatched end tag: expected </{}>, found </{}>", expected, name)
                            };
                            return Err(Error::parse(message, offset));
                        }
                    }
                }

                XmlEvent::Text(content) => {
                    let text = String::from_utf8_lossy(&content);
                    let whitespace_only = text.chars().all(|c| c.is_ascii_whitespace());

                    if at_top_level {
                        if strict && !whitespace_only {
                            return Err(Error::parse("Text content not allowed outside root element", offset));
                        }
                        continue;
                    }
                    if whitespace_only && !options.preserve_whitespace {
                        continue;
                    }
                    self.append_parsed_text(parent_id, &text);
                }

                XmlEvent::CData(content) => {
                    if at_top_level {
                        if strict {
                            return Err(Error::parse("CDATA section not allowed at document level", offset));
                        }
                        continue;
                    }
                    let text = String::from_utf8_lossy(&content);
                    self.append_character_data(parent_id, NodeKind::CData, &text);
                }

                XmlEvent::Comment(content) => {
                    let text = String::from_utf8_lossy(&content);
                    self.append_character_data(parent_id, NodeKind::Comment, &text);
                }

                XmlEvent::ProcessingInstruction { target, data } => {
                    let target = String::from_utf8_lossy(&target);
                    let data = data.as_deref().map(String::from_utf8_lossy).unwrap_or_default();
                    self.append_processing_instruction(parent_id, &target, &data);
                }

                XmlEvent::XmlDeclaration {
                    version,
                    encoding,
                    standalone,
                } => {
                    self.version = Some(String::from_utf8_lossy(&version).into_owned());
                    self.encoding = encoding.map(|e| String::from_utf8_lossy(&e).into_owned());
                    self.standalone = standalone;
                }

                XmlEvent::DocType => {
                    if strict && self.root_element.is_some() {
                        return Err(Error::parse("DOCTYPE must come before root element", offset));
                    }
                }

                XmlEvent::EndDocument => break,
            }
        }

        if let Some(err) = reader.error() {
            return Err(Error::parse(err.message.clone(), err.position));
        }

        if strict {
            if stack.len() > 1 {
                let unclosed = self.node_name(stack[1]).unwrap_or("");
                return Err(Error::parse(format!("Unclosed tag: <{}>", unclosed), reader.position()));
            }
            if self.root_element.is_none() {
                return Err(Error::parse("Document has no root element", reader.position()));
            }
        }

        Ok(())
    }

    fn append_parsed_element(&mut self, parent_id: NodeId, elem: &StartElement<'_>) -> NodeId {
        let name = String::from_utf8_lossy(&elem.name);
        let node_id = self.append_element(parent_id, &name);
        for attr in &elem.attributes {
            let attr_name = self.strings.intern_bytes(&attr.name);
            let attr_value = self.strings.intern_bytes(&attr.value);
            self.store_attribute(node_id, XmlAttribute::new(attr_name, attr_value));
        }
        node_id
    }

    /// Append text, merging with a directly preceding text sibling
    fn append_parsed_text(&mut self, parent_id: NodeId, text: &str) {
        let last = self.nodes[parent_id as usize].last_child;
        if let Some(last_id) = last {
            if self.nodes[last_id as usize].kind == NodeKind::Text {
                let mut merged = self.strings.get_str(self.nodes[last_id as usize].name_id).unwrap_or("").to_string();
                merged.push_str(text);
                self.nodes[last_id as usize].name_id = self.strings.intern(&merged);
                return;
            }
        }
        self.append_character_data(parent_id, NodeKind::Text, text);
    }

    fn push_node(&mut self, parent_id: NodeId, node: XmlNode) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        self.link_child(parent_id, node_id);
        node_id
    }

    fn child_depth(&self, parent_id: NodeId) -> u16 {
        self.nodes[parent_id as usize].depth.saturating_add(1)
    }

    /// Link a child node to its parent
    fn link_child(&mut self, parent_id: NodeId, child_id: NodeId) {
        let last_child_opt = self.nodes[parent_id as usize].last_child;

        if let Some(last_child_id) = last_child_opt {
            self.nodes[child_id as usize].prev_sibling = Some(last_child_id);
            self.nodes[last_child_id as usize].next_sibling = Some(child_id);
        } else {
            self.nodes[parent_id as usize].first_child = Some(child_id);
        }
        self.nodes[parent_id as usize].last_child = Some(child_id);
    }

    /// Append an element as the last child of `parent_id`.
    ///
    /// The first element appended to the document node becomes the root
    /// element.
    pub(crate) fn append_element(&mut self, parent_id: NodeId, name: &str) -> NodeId {
        let name_id = self.strings.intern(name);
        let depth = self.child_depth(parent_id);
        let node_id = self.push_node(parent_id, XmlNode::element(name_id, parent_id, depth));

        if parent_id == DOCUMENT_NODE && self.root_element.is_none() {
            self.root_element = Some(node_id);
        }
        node_id
    }

    /// Append a text, CDATA or comment node
    pub(crate) fn append_character_data(&mut self, parent_id: NodeId, kind: NodeKind, content: &str) -> NodeId {
        let content_id = self.strings.intern(content);
        let depth = self.child_depth(parent_id);
        self.push_node(parent_id, XmlNode::character_data(kind, content_id, parent_id, depth))
    }

    pub(crate) fn append_processing_instruction(&mut self, parent_id: NodeId, target: &str, data: &str) -> NodeId {
        let target_id = self.strings.intern(target);
        let data_id = self.strings.intern(data);
        let depth = self.child_depth(parent_id);
        self.push_node(
            parent_id,
            XmlNode::processing_instruction(target_id, data_id, parent_id, depth),
        )
    }

    fn store_attribute(&mut self, node_id: NodeId, attr: XmlAttribute) {
        let attributes = &mut self.nodes[node_id as usize].attributes;
        match attributes.iter_mut().find(|a| a.name_id == attr.name_id) {
            Some(existing) => existing.value_id = attr.value_id,
            None => attributes.push(attr),
        }
    }

    /// Set an attribute on an element, replacing any value under the same name
    pub(crate) fn set_attribute(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        match self.node_kind_of(node_id) {
            Some(NodeKind::Element) => {}
            _ => return Err(Error::InvalidOperation),
        }
        let name_id = self.strings.intern(name);
        let value_id = self.strings.intern(value);
        self.store_attribute(node_id, XmlAttribute::new(name_id, value_id));
        Ok(())
    }

    /// Replace the text value of a node.
    ///
    /// On an element the first text child is rewritten in place, or a new
    /// text child is appended when there is none. On character data nodes the
    /// content itself is replaced. The document node cannot carry text.
    pub(crate) fn set_text_value(&mut self, node_id: NodeId, text: &str) -> Result<()> {
        let kind = self.node_kind_of(node_id).ok_or(Error::InvalidOperation)?;
        let content_id = self.strings.intern(text);

        match kind {
            NodeKind::Element => {
                let first_text = self
                    .children(node_id)
                    .find(|&id| self.nodes[id as usize].kind == NodeKind::Text);
                match first_text {
                    Some(text_id) => self.nodes[text_id as usize].name_id = content_id,
                    None => {
                        self.append_character_data(node_id, NodeKind::Text, text);
                    }
                }
                Ok(())
            }
            NodeKind::Text | NodeKind::CData | NodeKind::Comment => {
                self.nodes[node_id as usize].name_id = content_id;
                Ok(())
            }
            NodeKind::ProcessingInstruction => {
                self.nodes[node_id as usize].value_id = content_id;
                Ok(())
            }
            NodeKind::Document => Err(Error::InvalidOperation),
        }
    }

    /// Deep-copy a node of another document as the last child of `parent_id`,
    /// returning the id of the copy
    pub(crate) fn import_subtree(&mut self, parent_id: NodeId, source: &XmlDocument, source_id: NodeId) -> Option<NodeId> {
        source.get_node(source_id)?;
        let mut imported_root = None;
        let mut stack = vec![(source_id, parent_id)];

        while let Some((src, new_parent)) = stack.pop() {
            let Some(node) = source.get_node(src) else { continue };
            let strings = source.strings();
            let name = strings.get_str(node.name_id).unwrap_or("");
            let value = strings.get_str(node.value_id).unwrap_or("");

            let copy = match node.kind {
                NodeKind::Document => continue,
                NodeKind::Element => {
                    let copy = self.append_element(new_parent, name);
                    for (attr_name, attr_value) in source.get_attribute_values(src) {
                        let name_id = self.strings.intern(attr_name);
                        let value_id = self.strings.intern(attr_value);
                        self.store_attribute(copy, XmlAttribute::new(name_id, value_id));
                    }
                    copy
                }
                NodeKind::ProcessingInstruction => self.append_processing_instruction(new_parent, name, value),
                kind => self.append_character_data(new_parent, kind, name),
            };
            imported_root.get_or_insert(copy);

            let mut child = node.last_child;
            while let Some(child_id) = child {
                stack.push((child_id, copy));
                child = source.prev_sibling_of(child_id);
            }
        }

        imported_root
    }

    /// Get the root element (first element child of document)
    pub fn root_element(&self) -> Option<&XmlNode> {
        self.root_element.map(|id| &self.nodes[id as usize])
    }

    /// Handle on the root element
    pub fn root(&self) -> Option<NodeRef<'_>> {
        self.root_element.map(|id| NodeRef::new(self, id))
    }

    /// Handle on any node, including the document node (id 0)
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.get_node(id).map(|_| NodeRef::new(self, id))
    }

    /// True when the document has no root element
    pub fn is_empty(&self) -> bool {
        self.root_element.is_none()
    }

    /// Get node count (including the document node)
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// XML version from the declaration, if the document was parsed from one
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// `standalone` pseudo-attribute of the declaration
    pub fn standalone(&self) -> Option<bool> {
        self.standalone
    }

    /// Iterate over children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        ChildIter {
            doc: self,
            next: self.first_child_of(id),
        }
    }

    /// Iterate over descendants of a node in document order
    pub fn descendants(&self, id: NodeId) -> DescendantIter<'_> {
        let mut iter = DescendantIter {
            doc: self,
            stack: Vec::new(),
        };
        iter.push_children(id);
        iter
    }

    /// All elements with the given tag name, at any depth, in document order
    pub fn elements_by_tag_name(&self, name: &str) -> Vec<NodeId> {
        let Some(name_id) = self.strings.lookup(name) else {
            return Vec::new();
        };
        self.descendants(DOCUMENT_NODE)
            .filter(|&id| {
                let node = &self.nodes[id as usize];
                node.is_element() && node.name_id == name_id
            })
            .collect()
    }

    /// Serialize the whole document, XML declaration included
    pub fn to_xml(&self) -> Result<String> {
        serialize::serialize_document(self)
    }
}

impl DocumentAccess for XmlDocument {
    fn root_element_id(&self) -> Option<NodeId> {
        self.root_element
    }

    fn get_node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id as usize)
    }

    fn strings(&self) -> &StringPool {
        &self.strings
    }
}

/// Iterator over child nodes
pub struct ChildIter<'d> {
    doc: &'d XmlDocument,
    next: Option<NodeId>,
}

impl<'d> Iterator for ChildIter<'d> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.next_sibling_of(current);
        Some(current)
    }
}

/// Iterator over descendant nodes (depth-first)
pub struct DescendantIter<'d> {
    doc: &'d XmlDocument,
    stack: Vec<NodeId>,
}

impl DescendantIter<'_> {
    /// Add children to stack in reverse order (so first child is processed first)
    fn push_children(&mut self, id: NodeId) {
        let mut child_id = self.doc.get_node(id).and_then(|n| n.last_child);
        while let Some(cid) = child_id {
            self.stack.push(cid);
            child_id = self.doc.prev_sibling_of(cid);
        }
    }
}

impl<'d> Iterator for DescendantIter<'d> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        self.push_children(current);
        Some(current)
    }
}
