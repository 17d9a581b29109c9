//! XML Event Types
//!
//! Event types for pull-parser style XML processing.

use crate::core::attributes::Attribute;
use std::borrow::Cow;

/// XML parsing event
#[derive(Debug, Clone)]
pub enum XmlEvent<'a> {
    /// Start of an element: <name attrs...>
    StartElement(StartElement<'a>),
    /// End of an element: </name>
    EndElement(EndElement<'a>),
    /// Empty element: <name attrs.../>
    EmptyElement(StartElement<'a>),
    /// Text content between tags
    Text(Cow<'a, [u8]>),
    /// CDATA section content
    CData(Cow<'a, [u8]>),
    /// Comment content
    Comment(Cow<'a, [u8]>),
    /// Processing instruction: <?target data?>
    ProcessingInstruction {
        target: Cow<'a, [u8]>,
        data: Option<Cow<'a, [u8]>>,
    },
    /// XML declaration: <?xml version="1.0"?>
    XmlDeclaration {
        version: Cow<'a, [u8]>,
        encoding: Option<Cow<'a, [u8]>>,
        standalone: Option<bool>,
    },
    /// DOCTYPE declaration; its body is skipped
    DocType,
    /// End of document
    EndDocument,
}

/// Start element event data
#[derive(Debug, Clone)]
pub struct StartElement<'a> {
    /// Full element name (may include prefix)
    pub name: Cow<'a, [u8]>,
    /// Element attributes
    pub attributes: Vec<Attribute<'a>>,
}

impl<'a> StartElement<'a> {
    pub fn new(name: &'a [u8], attributes: Vec<Attribute<'a>>) -> Self {
        StartElement {
            name: Cow::Borrowed(name),
            attributes,
        }
    }

}

/// End element event data
#[derive(Debug, Clone)]
pub struct EndElement<'a> {
    /// Full element name
    pub name: Cow<'a, [u8]>,
}

impl<'a> EndElement<'a> {
    pub fn new(name: &'a [u8]) -> Self {
        EndElement {
            name: Cow::Borrowed(name),
        }
    }

    /// Get the name as a string
    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(self.name.as_ref()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_element() {
        let elem = StartElement::new(b"svg:rect", vec![Attribute::new(b"x", Cow::Borrowed(b"1"))]);
        assert_eq!(elem.name.as_ref(), b"svg:rect");
        assert_eq!(elem.attributes.len(), 1);
    }

    #[test]
    fn test_end_element_name() {
        assert_eq!(EndElement::new(b"br").name_str(), Some("br"));
        assert_eq!(EndElement::new(b"\xff").name_str(), None);
    }
}
