//! XPath Value Types
//!
//! XPath 1.0 has four data types: node-set, boolean, number, and string.
//! Attributes are not nodes in this engine, so `@name` steps produce a
//! fifth shape, a list of attribute values, which converts like a node-set
//! of strings.

use crate::dom::{node_string_value, DocumentAccess, NodeId};

/// XPath value types
#[derive(Debug, Clone)]
#[must_use]
pub enum XPathValue {
    /// A set of nodes (ordered, no duplicates)
    NodeSet(Vec<NodeId>),
    /// Boolean value
    Boolean(bool),
    /// Floating-point number
    Number(f64),
    /// String value
    String(String),
    /// Attribute values selected by an attribute step, in document order
    StringList(Vec<String>),
}

/// Parse a string the way XPath `number()` does: optional minus, digits,
/// optional fraction, surrounding whitespace allowed. Anything else is NaN.
pub fn parse_number(s: &str) -> f64 {
    let t = s.trim();
    let digits = t.strip_prefix('-').unwrap_or(t);
    let valid = !digits.is_empty()
        && digits != "."
        && digits.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && digits.bytes().filter(|&b| b == b'.').count() <= 1;
    if valid {
        t.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

impl XPathValue {
    /// Create an empty node set
    pub fn empty_nodeset() -> Self {
        XPathValue::NodeSet(Vec::new())
    }

    /// Create a node set with a single node
    pub fn single_node(id: NodeId) -> Self {
        XPathValue::NodeSet(vec![id])
    }

    /// Convert to boolean (XPath boolean() function semantics)
    pub fn to_boolean(&self) -> bool {
        match self {
            XPathValue::NodeSet(nodes) => !nodes.is_empty(),
            XPathValue::Boolean(b) => *b,
            XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathValue::String(s) => !s.is_empty(),
            XPathValue::StringList(list) => !list.is_empty(),
        }
    }

    /// Convert to number (XPath number() function semantics)
    pub fn to_number(&self) -> f64 {
        match self {
            XPathValue::NodeSet(_) => f64::NAN,
            XPathValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            XPathValue::Number(n) => *n,
            XPathValue::String(s) => parse_number(s),
            XPathValue::StringList(list) => list.first().map_or(f64::NAN, |s| parse_number(s)),
        }
    }

    /// Convert to string (XPath string() function semantics).
    ///
    /// Node-sets need the document to resolve; use [`XPathValue::string_in`]
    /// when one is at hand. Here they convert to the empty string.
    pub fn to_string_value(&self) -> String {
        match self {
            XPathValue::NodeSet(_) => String::new(),
            XPathValue::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
            XPathValue::Number(n) => {
                if n.is_nan() {
                    "NaN".to_string()
                } else if n.is_infinite() {
                    if *n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
                } else if *n == n.trunc() && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            XPathValue::String(s) => s.clone(),
            XPathValue::StringList(list) => list.first().cloned().unwrap_or_default(),
        }
    }

    /// String conversion with document access: a node-set converts to the
    /// string-value of its first node
    pub fn string_in<D: DocumentAccess + ?Sized>(&self, doc: &D) -> String {
        match self {
            XPathValue::NodeSet(nodes) => nodes
                .first()
                .map(|&first| node_string_value(doc, first))
                .unwrap_or_default(),
            _ => self.to_string_value(),
        }
    }

    /// Number conversion with document access
    pub fn number_in<D: DocumentAccess + ?Sized>(&self, doc: &D) -> f64 {
        match self {
            XPathValue::NodeSet(_) => parse_number(&self.string_in(doc)),
            _ => self.to_number(),
        }
    }

    /// The members of a node-set or attribute list as strings, or `None`
    /// for scalar values
    pub fn member_strings<D: DocumentAccess + ?Sized>(&self, doc: &D) -> Option<Vec<String>> {
        match self {
            XPathValue::NodeSet(nodes) => Some(nodes.iter().map(|&n| node_string_value(doc, n)).collect()),
            XPathValue::StringList(list) => Some(list.clone()),
            _ => None,
        }
    }

    /// Check if this is a node set
    pub fn is_nodeset(&self) -> bool {
        matches!(self, XPathValue::NodeSet(_))
    }

    /// Check if this is a string list (attribute values)
    pub fn is_string_list(&self) -> bool {
        matches!(self, XPathValue::StringList(_))
    }

    /// Get as string list, or None
    pub fn as_string_list(&self) -> Option<&Vec<String>> {
        match self {
            XPathValue::StringList(list) => Some(list),
            _ => None,
        }
    }

    /// Get as node set, or None
    pub fn as_nodeset(&self) -> Option<&Vec<NodeId>> {
        match self {
            XPathValue::NodeSet(nodes) => Some(nodes),
            _ => None,
        }
    }

    /// Take the node set out of the value
    pub fn into_nodeset(self) -> Option<Vec<NodeId>> {
        match self {
            XPathValue::NodeSet(nodes) => Some(nodes),
            _ => None,
        }
    }
}

impl Default for XPathValue {
    fn default() -> Self {
        XPathValue::NodeSet(Vec::new())
    }
}

impl From<bool> for XPathValue {
    fn from(b: bool) -> Self {
        XPathValue::Boolean(b)
    }
}

impl From<f64> for XPathValue {
    fn from(n: f64) -> Self {
        XPathValue::Number(n)
    }
}

impl From<i64> for XPathValue {
    fn from(n: i64) -> Self {
        XPathValue::Number(n as f64)
    }
}

impl From<String> for XPathValue {
    fn from(s: String) -> Self {
        XPathValue::String(s)
    }
}

impl From<&str> for XPathValue {
    fn from(s: &str) -> Self {
        XPathValue::String(s.to_string())
    }
}

impl From<Vec<NodeId>> for XPathValue {
    fn from(nodes: Vec<NodeId>) -> Self {
        XPathValue::NodeSet(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_conversion() {
        assert!(XPathValue::NodeSet(vec![1]).to_boolean());
        assert!(!XPathValue::NodeSet(vec![]).to_boolean());
        assert!(XPathValue::Boolean(true).to_boolean());
        assert!(!XPathValue::Boolean(false).to_boolean());
        assert!(XPathValue::Number(1.0).to_boolean());
        assert!(!XPathValue::Number(0.0).to_boolean());
        assert!(XPathValue::String("hello".to_string()).to_boolean());
        assert!(!XPathValue::String(String::new()).to_boolean());
    }

    #[test]
    fn test_number_conversion() {
        assert_eq!(XPathValue::Boolean(true).to_number(), 1.0);
        assert_eq!(XPathValue::Boolean(false).to_number(), 0.0);
        assert_eq!(XPathValue::String("42".to_string()).to_number(), 42.0);
        assert!(XPathValue::String("abc".to_string()).to_number().is_nan());
        assert_eq!(XPathValue::String(" -1.5 ".to_string()).to_number(), -1.5);
        assert!(XPathValue::String("1e3".to_string()).to_number().is_nan());
        assert!(XPathValue::String("inf".to_string()).to_number().is_nan());
        assert!(XPathValue::String(".".to_string()).to_number().is_nan());
    }

    #[test]
    fn test_string_list_conversions() {
        let present_but_empty = XPathValue::StringList(vec![String::new()]);
        assert!(present_but_empty.to_boolean());
        assert!(!XPathValue::StringList(Vec::new()).to_boolean());
        assert_eq!(XPathValue::StringList(vec!["7".into(), "8".into()]).to_number(), 7.0);
    }

    #[test]
    fn test_document_aware_conversions() {
        let doc = crate::dom::XmlDocument::parse("<r><p>12</p><p>30</p></r>").unwrap();
        let ps = XPathValue::NodeSet(doc.elements_by_tag_name("p"));
        assert_eq!(ps.string_in(&doc), "12");
        assert_eq!(ps.number_in(&doc), 12.0);
        assert_eq!(ps.member_strings(&doc), Some(vec!["12".to_string(), "30".to_string()]));
        assert_eq!(XPathValue::empty_nodeset().string_in(&doc), "");
        assert!(XPathValue::Number(1.0).member_strings(&doc).is_none());
    }

    #[test]
    fn test_string_conversion() {
        assert_eq!(XPathValue::Boolean(true).to_string_value(), "true");
        assert_eq!(XPathValue::Boolean(false).to_string_value(), "false");
        assert_eq!(XPathValue::Number(42.0).to_string_value(), "42");
        assert_eq!(XPathValue::Number(3.25).to_string_value(), "3.25");
    }
}
