//! Slice reader
//!
//! Parses XML from a byte slice into events, borrowing from the input
//! wherever no entity decoding was needed.

use super::events::{EndElement, StartElement, XmlEvent};
use crate::core::attributes::{parse_attributes, parse_attributes_strict, Attribute};
use crate::core::tokenizer::{ParseError, Token, TokenKind, Tokenizer};
use std::borrow::Cow;

/// Pull reader over a byte slice
pub struct SliceReader<'a> {
    tokenizer: Tokenizer<'a>,
    strict: bool,
    attr_error: Option<ParseError>,
}

impl<'a> SliceReader<'a> {
    /// Create a new slice reader (lenient mode)
    pub fn new(input: &'a [u8]) -> Self {
        SliceReader {
            tokenizer: Tokenizer::new(input),
            strict: false,
            attr_error: None,
        }
    }

    /// Create a new slice reader in strict mode
    pub fn new_strict(input: &'a [u8]) -> Self {
        SliceReader {
            tokenizer: Tokenizer::new_strict(input),
            strict: true,
            attr_error: None,
        }
    }

    /// Get parse error (strict mode only)
    pub fn error(&self) -> Option<&ParseError> {
        self.attr_error.as_ref().or_else(|| self.tokenizer.error())
    }

    /// Byte offset of the reader
    pub fn position(&self) -> usize {
        self.tokenizer.position()
    }

    /// Get the next XML event
    pub fn next_event(&mut self) -> Option<XmlEvent<'a>> {
        if self.attr_error.is_some() {
            return None;
        }

        loop {
            let token = self.tokenizer.next_token()?;

            match token.kind {
                TokenKind::Eof => return Some(XmlEvent::EndDocument),

                TokenKind::StartTag | TokenKind::EmptyTag => {
                    let attrs = self.tag_attributes(&token)?;
                    let start = StartElement::new(token.name?, attrs);
                    return Some(if token.kind == TokenKind::EmptyTag {
                        XmlEvent::EmptyElement(start)
                    } else {
                        XmlEvent::StartElement(start)
                    });
                }

                TokenKind::EndTag => return Some(XmlEvent::EndElement(EndElement::new(token.name?))),

                TokenKind::Text => match token.content {
                    Some(content) if !content.is_empty() => return Some(XmlEvent::Text(content)),
                    _ => {}
                },

                TokenKind::CData => return Some(XmlEvent::CData(token.content.unwrap_or_default())),

                TokenKind::Comment => return Some(XmlEvent::Comment(token.content.unwrap_or_default())),

                TokenKind::ProcessingInstruction => {
                    let data = token.content.filter(|d| !d.is_empty());
                    return Some(XmlEvent::ProcessingInstruction {
                        target: Cow::Borrowed(token.name?),
                        data,
                    });
                }

                TokenKind::XmlDeclaration => {
                    let attrs = self.tag_attributes(&token)?;
                    let find = |name: &[u8]| {
                        attrs
                            .iter()
                            .find(|a| a.name.as_ref() == name)
                            .map(|a| a.value.clone())
                    };
                    let version = find(b"version").unwrap_or(Cow::Borrowed(b"1.0"));
                    let encoding = find(b"encoding");
                    let standalone = find(b"standalone").map(|v| v.as_ref() == b"yes");
                    return Some(XmlEvent::XmlDeclaration {
                        version,
                        encoding,
                        standalone,
                    });
                }

                TokenKind::DocType => return Some(XmlEvent::DocType),
            }
        }
    }

    /// Parse the attribute region of a tag token; `None` stops a strict reader
    fn tag_attributes(&mut self, token: &Token<'a>) -> Option<Vec<Attribute<'a>>> {
        let region: &'a [u8] = match &token.content {
            Some(Cow::Borrowed(region)) => *region,
            _ => return Some(Vec::new()),
        };

        if !self.strict {
            return Some(parse_attributes(region));
        }
        match parse_attributes_strict(region) {
            Ok(attrs) => Some(attrs),
            Err(msg) => {
                self.attr_error = Some(ParseError::new(msg, token.span.0));
                None
            }
        }
    }
}

impl<'a> Iterator for SliceReader<'a> {
    type Item = XmlEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_event()? {
            XmlEvent::EndDocument => None,
            event => Some(event),
        }
    }
}
