//! Conversion of the accepted input shapes into an [`XmlDocument`]
//!
//! Everything the matcher and the builder interoperate through goes via
//! [`IntoXml`]: documents, builders, node handles, XML text and nested
//! key-value structures in the form of `serde_json::Value`.

use serde_json::{Map, Value};

use crate::builder::XmlBuilder;
use crate::core::scanner::is_valid_name;
use crate::dom::{NodeId, NodeKind, NodeRef, XmlDocument, DOCUMENT_NODE};
use crate::error::{Error, Result};

/// Anything that can be normalized into a document
pub trait IntoXml {
    fn into_xml(self) -> Result<XmlDocument>;
}

impl IntoXml for XmlDocument {
    fn into_xml(self) -> Result<XmlDocument> {
        Ok(self)
    }
}

impl IntoXml for &XmlDocument {
    fn into_xml(self) -> Result<XmlDocument> {
        Ok(self.clone())
    }
}

impl IntoXml for XmlBuilder {
    fn into_xml(self) -> Result<XmlDocument> {
        Ok(self.into_document())
    }
}

impl IntoXml for &XmlBuilder {
    fn into_xml(self) -> Result<XmlDocument> {
        Ok(self.document().clone())
    }
}

/// The referenced element becomes the root of a fresh document; a handle on
/// the document node copies the whole document
impl IntoXml for NodeRef<'_> {
    fn into_xml(self) -> Result<XmlDocument> {
        match self.kind() {
            NodeKind::Document => Ok(self.document().clone()),
            NodeKind::Element => {
                let mut doc = XmlDocument::new();
                doc.import_subtree(DOCUMENT_NODE, self.document(), self.id());
                Ok(doc)
            }
            kind => Err(Error::InvalidInput(format!("a {:?} node cannot be a document root", kind))),
        }
    }
}

impl IntoXml for &str {
    fn into_xml(self) -> Result<XmlDocument> {
        XmlDocument::parse(self)
    }
}

impl IntoXml for String {
    fn into_xml(self) -> Result<XmlDocument> {
        XmlDocument::parse(&self)
    }
}

impl IntoXml for &String {
    fn into_xml(self) -> Result<XmlDocument> {
        XmlDocument::parse(self)
    }
}

impl IntoXml for Value {
    fn into_xml(self) -> Result<XmlDocument> {
        json_to_document(&self)
    }
}

impl IntoXml for &Value {
    fn into_xml(self) -> Result<XmlDocument> {
        json_to_document(self)
    }
}

impl<T: IntoXml> IntoXml for Option<T> {
    fn into_xml(self) -> Result<XmlDocument> {
        match self {
            Some(inner) => inner.into_xml(),
            None => Ok(XmlDocument::new()),
        }
    }
}

impl IntoXml for () {
    fn into_xml(self) -> Result<XmlDocument> {
        Ok(XmlDocument::new())
    }
}

/// Map a JSON value onto elements.
///
/// Object members become child elements named after their key, arrays
/// repeat the key once per item, scalars become text and `null` leaves the
/// element empty. Top-level members become top-level elements; the first
/// one is the root element.
fn json_to_document(value: &Value) -> Result<XmlDocument> {
    let mut doc = XmlDocument::new();
    match value {
        Value::Null => {}
        Value::Object(members) => append_members(&mut doc, DOCUMENT_NODE, members)?,
        other => {
            return Err(Error::InvalidInput(format!(
                "expected a JSON object at the top level, found {}",
                json_kind(other)
            )))
        }
    }
    Ok(doc)
}

fn append_members(doc: &mut XmlDocument, parent: NodeId, members: &Map<String, Value>) -> Result<()> {
    for (key, value) in members {
        append_member(doc, parent, key, value)?;
    }
    Ok(())
}

fn append_member(doc: &mut XmlDocument, parent: NodeId, key: &str, value: &Value) -> Result<()> {
    if let Value::Array(items) = value {
        for item in items {
            append_member(doc, parent, key, item)?;
        }
        return Ok(());
    }

    if !is_valid_name(key) {
        return Err(Error::InvalidInput(format!("{:?} is not a valid element name", key)));
    }

    let element = doc.append_element(parent, key);
    match value {
        Value::Object(members) => append_members(doc, element, members)?,
        Value::String(text) => append_text(doc, element, text),
        Value::Number(n) => append_text(doc, element, &n.to_string()),
        Value::Bool(b) => append_text(doc, element, if *b { "true" } else { "false" }),
        Value::Null | Value::Array(_) => {}
    }
    Ok(())
}

fn append_text(doc: &mut XmlDocument, parent: NodeId, text: &str) {
    if !text.is_empty() {
        doc.append_character_data(parent, NodeKind::Text, text);
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_inputs() {
        let doc = "<a><b/></a>".into_xml().unwrap();
        assert_eq!(doc.root().unwrap().name(), Some("a"));

        assert!(String::from("   ").into_xml().unwrap().is_empty());
        assert!(matches!("<a>".into_xml(), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_absent_inputs_are_empty() {
        assert!(().into_xml().unwrap().is_empty());
        assert!(None::<&str>.into_xml().unwrap().is_empty());
        assert!(Value::Null.into_xml().unwrap().is_empty());
        assert_eq!(Some("<x/>").into_xml().unwrap().root().unwrap().name(), Some("x"));
    }

    #[test]
    fn test_json_objects_become_elements() {
        let value = json!({
            "user": {
                "active": true,
                "age": 30,
                "cart": null,
                "item": ["a", "b"],
                "name": "davert"
            }
        });
        let doc = value.into_xml().unwrap();
        assert_eq!(
            doc.root().unwrap().to_xml().unwrap(),
            "<user><active>true</active><age>30</age><cart/><item>a</item><item>b</item><name>davert</name></user>"
        );
    }

    #[test]
    fn test_json_rejects_non_objects_and_bad_keys() {
        assert!(matches!(json!([1, 2]).into_xml(), Err(Error::InvalidInput(_))));
        assert!(matches!(json!("text").into_xml(), Err(Error::InvalidInput(_))));
        assert!(matches!(json!({"bad key": 1}).into_xml(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_node_ref_becomes_root() {
        let source = XmlDocument::parse("<a><b x='1'><c/></b><d/></a>").unwrap();
        let b = source.root().unwrap().children().next().unwrap();
        let doc = b.into_xml().unwrap();
        assert_eq!(doc.to_xml().unwrap(), "<?xml version=\"1.0\"?>\n<b x=\"1\"><c/></b>\n");

        let whole = source.node(DOCUMENT_NODE).unwrap().into_xml().unwrap();
        assert_eq!(whole.node_count(), source.node_count());
    }

    #[test]
    fn test_builder_inputs() {
        let mut builder = XmlBuilder::new();
        builder.child("users").child("user");
        let borrowed = (&builder).into_xml().unwrap();
        let owned = builder.into_xml().unwrap();
        assert_eq!(borrowed.to_xml().unwrap(), owned.to_xml().unwrap());
    }
}
