//! XML Entity Decoding and Encoding
//!
//! Handles decoding of XML entities:
//! - Built-in entities: &lt; &gt; &amp; &quot; &apos;
//! - Numeric character references: &#123; &#x7B;
//!
//! Uses Cow for zero-copy when no entities are present.

use memchr::memchr;
use std::borrow::Cow;

/// Decode text content, handling entity references
///
/// Returns Borrowed if no entities present (zero-copy),
/// returns Owned if entities were decoded. Unknown or malformed references
/// are kept verbatim.
#[inline]
pub fn decode_text(input: &[u8]) -> Cow<'_, [u8]> {
    if memchr(b'&', input).is_none() {
        return Cow::Borrowed(input);
    }
    match decode_entities(input, false) {
        Ok(decoded) => Cow::Owned(decoded),
        Err(_) => Cow::Borrowed(input),
    }
}

/// Decode text content in strict mode
///
/// Fails on numeric references to characters outside the XML 1.0 `Char`
/// production and on `&` that does not start a terminated reference.
pub fn decode_text_strict(input: &[u8]) -> Result<Cow<'_, [u8]>, &'static str> {
    if memchr(b'&', input).is_none() {
        return Ok(Cow::Borrowed(input));
    }
    decode_entities(input, true).map(Cow::Owned)
}

fn decode_entities(input: &[u8], strict: bool) -> Result<Vec<u8>, &'static str> {
    let mut result = Vec::with_capacity(input.len());
    let mut pos = 0;

    while pos < input.len() {
        let Some(amp_pos) = memchr(b'&', &input[pos..]) else {
            result.extend_from_slice(&input[pos..]);
            break;
        };
        result.extend_from_slice(&input[pos..pos + amp_pos]);
        pos += amp_pos;

        let Some(semi_offset) = memchr(b';', &input[pos..]) else {
            if strict {
                return Err("Unterminated entity reference");
            }
            result.push(b'&');
            pos += 1;
            continue;
        };

        let entity = &input[pos + 1..pos + semi_offset];
        match decode_entity(entity, strict)? {
            Some(decoded) => {
                result.extend_from_slice(decoded.as_bytes());
                pos += semi_offset + 1;
            }
            None => {
                result.push(b'&');
                pos += 1;
            }
        }
    }

    Ok(result)
}

/// Decode a single entity (without & and ;)
fn decode_entity(entity: &[u8], strict: bool) -> Result<Option<String>, &'static str> {
    if entity.is_empty() {
        return if strict { Err("Empty entity reference") } else { Ok(None) };
    }

    if entity[0] == b'#' {
        return match decode_numeric_entity(&entity[1..], strict) {
            Some(s) => Ok(Some(s)),
            None if strict => Err("Invalid character reference"),
            None => Ok(None),
        };
    }

    let named = match entity {
        b"lt" => "<",
        b"gt" => ">",
        b"amp" => "&",
        b"quot" => "\"",
        b"apos" => "'",
        // Common HTML entities, accepted only when parsing leniently
        b"nbsp" if !strict => "\u{00A0}",
        b"copy" if !strict => "\u{00A9}",
        b"mdash" if !strict => "\u{2014}",
        b"ndash" if !strict => "\u{2013}",
        b"hellip" if !strict => "\u{2026}",
        _ => return Ok(None),
    };
    Ok(Some(named.to_string()))
}

/// Decode a numeric character reference with optional XML character validation
fn decode_numeric_entity(entity: &[u8], strict: bool) -> Option<String> {
    if entity.is_empty() {
        return None;
    }

    let codepoint = if entity[0] == b'x' || entity[0] == b'X' {
        let hex = std::str::from_utf8(&entity[1..]).ok()?;
        u32::from_str_radix(hex, 16).ok()?
    } else {
        let dec = std::str::from_utf8(entity).ok()?;
        dec.parse::<u32>().ok()?
    };

    if strict && !is_valid_xml_char(codepoint) {
        return None;
    }

    char::from_u32(codepoint).map(|c| c.to_string())
}

/// Check if a code point is a valid XML 1.0 Char
/// Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
#[inline]
pub fn is_valid_xml_char(codepoint: u32) -> bool {
    matches!(codepoint,
        0x9 | 0xA | 0xD | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x10000..=0x10FFFF)
}

/// Encode text content for XML output
pub fn encode_text(input: &str) -> Cow<'_, str> {
    encode_with(input, false)
}

/// Encode text for use in double-quoted XML attributes
pub fn encode_attribute(input: &str) -> Cow<'_, str> {
    encode_with(input, true)
}

fn encode_with(input: &str, quote: bool) -> Cow<'_, str> {
    let needs_escape = input
        .bytes()
        .any(|b| matches!(b, b'<' | b'>' | b'&') || (quote && b == b'"'));
    if !needs_escape {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' if quote => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entities() {
        let result = decode_text(b"Hello, World!");
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result.as_ref(), b"Hello, World!");
    }

    #[test]
    fn test_basic_entities() {
        let result = decode_text(b"&lt;hello&gt; &amp; &quot;world&quot;");
        assert_eq!(result.as_ref(), b"<hello> & \"world\"");
    }

    #[test]
    fn test_numeric_references() {
        assert_eq!(decode_text(b"&#65;&#66;&#67;").as_ref(), b"ABC");
        assert_eq!(decode_text(b"&#x41;&#x42;&#x43;").as_ref(), b"ABC");
    }

    #[test]
    fn test_unknown_entity_kept() {
        assert_eq!(decode_text(b"&unknown;").as_ref(), b"&unknown;");
        assert_eq!(decode_text(b"fish & chips").as_ref(), b"fish & chips");
    }

    #[test]
    fn test_strict_rejects_bad_references() {
        assert!(decode_text_strict(b"&#0;").is_err());
        assert!(decode_text_strict(b"fish & chips").is_err());
        assert_eq!(decode_text_strict(b"a &amp; b").unwrap().as_ref(), b"a & b");
    }

    #[test]
    fn test_strict_ignores_html_entities() {
        let decoded = decode_text_strict(b"&nbsp;").unwrap();
        assert_eq!(decoded.as_ref(), b"&nbsp;");
        assert_eq!(decode_text(b"&nbsp;").as_ref(), "\u{00A0}".as_bytes());
    }

    #[test]
    fn test_encode_text() {
        assert_eq!(encode_text("<hello> & \"world\""), "&lt;hello&gt; &amp; \"world\"");
        assert!(matches!(encode_text("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_encode_attribute() {
        assert_eq!(encode_attribute("say \"hi\" & <go>"), "say &quot;hi&quot; &amp; &lt;go&gt;");
    }
}
