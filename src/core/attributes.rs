//! XML Attribute Parsing
//!
//! Parses XML attributes from tag content.

use super::entities::{decode_text, decode_text_strict};
use super::scanner::{is_name_char, is_name_start_char, is_whitespace};
use std::borrow::Cow;

/// A parsed XML attribute
#[derive(Debug, Clone)]
pub struct Attribute<'a> {
    /// Attribute name (may include namespace prefix)
    pub name: Cow<'a, [u8]>,
    /// Attribute value (entities decoded)
    pub value: Cow<'a, [u8]>,
}

impl<'a> Attribute<'a> {
    pub fn new(name: &'a [u8], value: Cow<'a, [u8]>) -> Self {
        Attribute {
            name: Cow::Borrowed(name),
            value,
        }
    }

    /// Get the value as a string
    #[cfg(test)]
    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(self.value.as_ref()).ok()
    }
}

/// Parse attributes from raw tag content (after the element name)
///
/// Input should be the content between element name and '>' or '/>'.
/// Malformed attributes are skipped.
pub fn parse_attributes(input: &[u8]) -> Vec<Attribute<'_>> {
    parse_attributes_with_validation(input, false).0
}

/// Parse attributes, failing on the first well-formedness violation
pub fn parse_attributes_strict(input: &[u8]) -> Result<Vec<Attribute<'_>>, &'static str> {
    match parse_attributes_with_validation(input, true) {
        (_, Some(msg)) => Err(msg),
        (attrs, None) => Ok(attrs),
    }
}

fn parse_attributes_with_validation(input: &[u8], strict: bool) -> (Vec<Attribute<'_>>, Option<&'static str>) {
    let mut attrs: Vec<Attribute<'_>> = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() {
            break;
        }

        if !is_name_start_char(input[pos]) {
            if strict {
                return (attrs, Some("Attribute name must start with letter, underscore, or colon"));
            }
            pos += 1;
            continue;
        }

        let name_start = pos;
        while pos < input.len() && is_name_char(input[pos]) {
            pos += 1;
        }
        let name = &input[name_start..pos];

        if strict && attrs.iter().any(|a| a.name.as_ref() == name) {
            return (attrs, Some("Duplicate attribute"));
        }

        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }

        if pos >= input.len() || input[pos] != b'=' {
            if strict {
                return (attrs, Some("Attribute value required"));
            }
            // Attribute without value (like HTML boolean attributes)
            attrs.push(Attribute::new(name, Cow::Borrowed(b"")));
            continue;
        }
        pos += 1;

        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() {
            if strict {
                return (attrs, Some("Attribute value required"));
            }
            break;
        }

        let quote = input[pos];
        if quote != b'"' && quote != b'\'' {
            if strict {
                return (attrs, Some("Attribute value must be quoted"));
            }
            let value_start = pos;
            while pos < input.len() && !is_whitespace(input[pos]) {
                pos += 1;
            }
            attrs.push(Attribute::new(name, decode_text(&input[value_start..pos])));
            continue;
        }

        pos += 1;
        let value_start = pos;
        while pos < input.len() && input[pos] != quote {
            if strict && input[pos] == b'<' {
                return (attrs, Some("Attribute value cannot contain '<'"));
            }
            pos += 1;
        }

        if strict && pos >= input.len() {
            return (attrs, Some("Attribute value has mismatched quotes"));
        }

        let value_bytes = &input[value_start..pos];
        let value = if strict {
            match decode_text_strict(value_bytes) {
                Ok(v) => v,
                Err(msg) => return (attrs, Some(msg)),
            }
        } else {
            decode_text(value_bytes)
        };
        attrs.push(Attribute::new(name, value));

        if pos < input.len() {
            pos += 1; // closing quote
        }
    }

    (attrs, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_attributes() {
        let attrs = parse_attributes(b" id=\"test\" class=\"foo\"");
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].name.as_ref(), b"id");
        assert_eq!(attrs[0].value_str(), Some("test"));
        assert_eq!(attrs[1].name.as_ref(), b"class");
        assert_eq!(attrs[1].value_str(), Some("foo"));
    }

    #[test]
    fn test_single_quoted() {
        let attrs = parse_attributes(b" id='test'");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].value_str(), Some("test"));
    }

    #[test]
    fn test_entity_in_value() {
        let attrs = parse_attributes(b" title=\"&lt;hello&gt;\"");
        assert_eq!(attrs[0].value_str(), Some("<hello>"));
    }

    #[test]
    fn test_whitespace_handling() {
        let attrs = parse_attributes(b"  id  =  \"test\"  ");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].name.as_ref(), b"id");
        assert_eq!(attrs[0].value_str(), Some("test"));
    }

    #[test]
    fn test_lenient_bare_attribute() {
        let attrs = parse_attributes(b" checked id=x");
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].value_str(), Some(""));
        assert_eq!(attrs[1].value_str(), Some("x"));
    }

    #[test]
    fn test_strict_errors() {
        assert!(parse_attributes_strict(b" checked").is_err());
        assert!(parse_attributes_strict(b" id=x").is_err());
        assert!(parse_attributes_strict(b" id=\"a\" id=\"b\"").is_err());
        assert!(parse_attributes_strict(b" id=\"unterminated").is_err());
        assert_eq!(parse_attributes_strict(b" a=\"1\" b='2'").map(|a| a.len()), Ok(2));
    }
}
