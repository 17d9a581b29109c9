//! XML serialization
//!
//! Writes nodes back out as XML text using an explicit stack, so deep trees
//! never recurse. Names are validated on the way out; character data is
//! escaped.

use super::document::XmlDocument;
use super::node::{NodeId, NodeKind};
use super::DocumentAccess;
use crate::core::entities::{encode_attribute, encode_text};
use crate::core::scanner::is_valid_name;
use crate::error::{Error, Result};

/// Serialize a whole document: XML declaration, then every top-level node on
/// its own line.
///
/// A document with more than one top-level element is not well-formed and
/// fails with [`Error::SerializationFailed`].
pub fn serialize_document(doc: &XmlDocument) -> Result<String> {
    let top_level = doc.children_vec(doc.document_node_id());
    let roots = top_level
        .iter()
        .filter(|&&id| doc.node_kind_of(id) == Some(NodeKind::Element))
        .count();
    if roots > 1 {
        return Err(Error::SerializationFailed(format!("{} top-level elements, expected one", roots)));
    }

    let mut buf = String::with_capacity(64 + doc.node_count() * 16);
    buf.push_str("<?xml version=\"");
    buf.push_str(doc.version().unwrap_or("1.0"));
    buf.push('"');
    if let Some(encoding) = doc.encoding() {
        buf.push_str(" encoding=\"");
        buf.push_str(&encode_attribute(encoding));
        buf.push('"');
    }
    if let Some(standalone) = doc.standalone() {
        buf.push_str(if standalone { " standalone=\"yes\"" } else { " standalone=\"no\"" });
    }
    buf.push_str("?>\n");

    for child in top_level {
        write_node(doc, child, &mut buf)?;
        buf.push('\n');
    }

    Ok(buf)
}

/// Serialize one node and its subtree, without a declaration.
///
/// The document node serializes as its top-level nodes, newline separated.
pub fn serialize_node<D: DocumentAccess>(doc: &D, node_id: NodeId) -> Result<String> {
    let mut buf = String::with_capacity(256);
    if doc.node_kind_of(node_id) == Some(NodeKind::Document) {
        for (i, child) in doc.children_vec(node_id).into_iter().enumerate() {
            if i > 0 {
                buf.push('\n');
            }
            write_node(doc, child, &mut buf)?;
        }
    } else {
        write_node(doc, node_id, &mut buf)?;
    }
    Ok(buf)
}

fn write_node<D: DocumentAccess>(doc: &D, node_id: NodeId, buf: &mut String) -> Result<()> {
    // Stack entries: Either entering a node or need to write closing tag
    enum StackEntry {
        Enter(NodeId),
        Close(NodeId),
    }

    let mut stack: Vec<StackEntry> = Vec::with_capacity(64);
    stack.push(StackEntry::Enter(node_id));

    while let Some(entry) = stack.pop() {
        match entry {
            StackEntry::Close(id) => {
                buf.push_str("</");
                buf.push_str(doc.node_name(id).unwrap_or(""));
                buf.push('>');
            }
            StackEntry::Enter(current_id) => {
                let Some(node) = doc.get_node(current_id) else {
                    continue;
                };

                match node.kind {
                    NodeKind::Element => {
                        let name = doc.node_name(current_id).unwrap_or("");
                        if !is_valid_name(name) {
                            return Err(Error::SerializationFailed(format!("invalid element name {:?}", name)));
                        }
                        buf.push('<');
                        buf.push_str(name);

                        for (attr_name, attr_value) in doc.get_attribute_values(current_id) {
                            if !is_valid_name(attr_name) {
                                return Err(Error::SerializationFailed(format!(
                                    "invalid attribute name {:?} on <{}>",
                                    attr_name, name
                                )));
                            }
                            buf.push(' ');
                            buf.push_str(attr_name);
                            buf.push_str("=\"");
                            buf.push_str(&encode_attribute(attr_value));
                            buf.push('"');
                        }

                        if node.first_child.is_none() {
                            buf.push_str("/>");
                        } else {
                            buf.push('>');
                            stack.push(StackEntry::Close(current_id));

                            // Children pushed in reverse so the first is written first
                            let mut child_id = node.last_child;
                            while let Some(cid) = child_id {
                                stack.push(StackEntry::Enter(cid));
                                child_id = doc.prev_sibling_of(cid);
                            }
                        }
                    }
                    NodeKind::Text => {
                        buf.push_str(&encode_text(doc.text_content(current_id).unwrap_or("")));
                    }
                    NodeKind::CData => {
                        // A literal "]]>" has to be split across two sections
                        let content = doc.text_content(current_id).unwrap_or("");
                        buf.push_str("<![CDATA[");
                        buf.push_str(&content.replace("]]>", "]]]]><![CDATA[>"));
                        buf.push_str("]]>");
                    }
                    NodeKind::Comment => {
                        let content = doc.text_content(current_id).unwrap_or("");
                        if content.contains("--") || content.ends_with('-') {
                            return Err(Error::SerializationFailed(format!("invalid comment {:?}", content)));
                        }
                        buf.push_str("<!--");
                        buf.push_str(content);
                        buf.push_str("-->");
                    }
                    NodeKind::ProcessingInstruction => {
                        let target = doc.node_name(current_id).unwrap_or("");
                        if !is_valid_name(target) {
                            return Err(Error::SerializationFailed(format!(
                                "invalid processing instruction target {:?}",
                                target
                            )));
                        }
                        buf.push_str("<?");
                        buf.push_str(target);
                        let data = doc.text_content(current_id).unwrap_or("");
                        if !data.is_empty() {
                            buf.push(' ');
                            buf.push_str(data);
                        }
                        buf.push_str("?>");
                    }
                    NodeKind::Document => {
                        let mut child_id = node.last_child;
                        while let Some(cid) = child_id {
                            stack.push(StackEntry::Enter(cid));
                            child_id = doc.prev_sibling_of(cid);
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DOCUMENT_NODE;

    #[test]
    fn test_document_declaration_and_newlines() {
        let doc = XmlDocument::parse("<a><b>1</b><c/></a>").unwrap();
        assert_eq!(serialize_document(&doc).unwrap(), "<?xml version=\"1.0\"?>\n<a><b>1</b><c/></a>\n");
    }

    #[test]
    fn test_encoding_is_emitted() {
        let doc = XmlDocument::parse("<?xml version=\"1.0\" encoding=\"UTF-8\"?><a/>").unwrap();
        assert_eq!(serialize_document(&doc).unwrap(), "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<a/>\n");

        let doc = XmlDocument::parse("<?xml version=\"1.1\" standalone=\"yes\"?><a/>").unwrap();
        assert_eq!(doc.standalone(), Some(true));
        assert_eq!(serialize_document(&doc).unwrap(), "<?xml version=\"1.1\" standalone=\"yes\"?>\n<a/>\n");
    }

    #[test]
    fn test_empty_document() {
        let doc = XmlDocument::new();
        assert_eq!(serialize_document(&doc).unwrap(), "<?xml version=\"1.0\"?>\n");
    }

    #[test]
    fn test_escaping() {
        let mut doc = XmlDocument::new();
        let a = doc.append_element(DOCUMENT_NODE, "a");
        doc.set_attribute(a, "q", "say \"x\" & <y>").unwrap();
        doc.set_text_value(a, "1 < 2 & \"3\"").unwrap();
        assert_eq!(
            serialize_node(&doc, a).unwrap(),
            "<a q=\"say &quot;x&quot; &amp; &lt;y&gt;\">1 &lt; 2 &amp; \"3\"</a>"
        );
    }

    #[test]
    fn test_top_level_comment_and_pi() {
        let doc = XmlDocument::parse("<!--c--><?go fast?><r/>").unwrap();
        assert_eq!(
            serialize_document(&doc).unwrap(),
            "<?xml version=\"1.0\"?>\n<!--c-->\n<?go fast?>\n<r/>\n"
        );
    }

    #[test]
    fn test_invalid_names_fail() {
        let mut doc = XmlDocument::new();
        doc.append_element(DOCUMENT_NODE, "");
        assert!(matches!(serialize_document(&doc), Err(Error::SerializationFailed(_))));

        let mut doc = XmlDocument::new();
        let ok = doc.append_element(DOCUMENT_NODE, "ok");
        doc.set_attribute(ok, "bad name", "v").unwrap();
        assert!(matches!(serialize_node(&doc, ok), Err(Error::SerializationFailed(_))));
    }

    #[test]
    fn test_second_top_level_element_fails() {
        let mut doc = XmlDocument::new();
        doc.append_element(DOCUMENT_NODE, "a");
        doc.append_element(DOCUMENT_NODE, "b");
        assert_eq!(
            serialize_document(&doc),
            Err(Error::SerializationFailed("2 top-level elements, expected one".to_string()))
        );
        assert_eq!(serialize_node(&doc, DOCUMENT_NODE).unwrap(), "<a/>\n<b/>");
    }

    #[test]
    fn test_cdata_round_trip() {
        let doc = XmlDocument::parse("<r><![CDATA[a < b]]></r>").unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(serialize_node(&doc, root).unwrap(), "<r><![CDATA[a < b]]></r>");
    }
}
