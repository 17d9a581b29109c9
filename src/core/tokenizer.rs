//! XML Tokenizer
//!
//! Pull-parser style tokenizer that extracts XML tokens:
//! - Element start/end/empty tags
//! - Text content (entities decoded)
//! - CDATA sections
//! - Comments
//! - Processing instructions and the XML declaration
//! - DOCTYPE declarations (passed through, never interpreted)
//!
//! The tokenizer only checks lexical well-formedness. Tag nesting is checked
//! by whoever consumes the tokens.

use super::entities::{decode_text, decode_text_strict};
use super::scanner::{is_whitespace, Scanner};
use std::borrow::Cow;

/// Type of XML token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Element start tag: <element>
    StartTag,
    /// Element end tag: </element>
    EndTag,
    /// Empty element: <element/>
    EmptyTag,
    /// Text content
    Text,
    /// CDATA section: <![CDATA[...]]>
    CData,
    /// Comment: <!--...-->
    Comment,
    /// Processing instruction: <?target ...?>
    ProcessingInstruction,
    /// XML declaration: <?xml ...?>
    XmlDeclaration,
    /// DOCTYPE declaration
    DocType,
    /// End of file
    Eof,
}

/// A parsed XML token
#[derive(Debug, Clone)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Raw span in input (start, end)
    pub span: (usize, usize),
    /// Element name or PI target
    pub name: Option<&'a [u8]>,
    /// Text/CDATA/comment content, PI data, or the raw attribute region of a
    /// start tag, empty tag or XML declaration
    pub content: Option<Cow<'a, [u8]>>,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, span: (usize, usize)) -> Self {
        Token {
            kind,
            span,
            name: None,
            content: None,
        }
    }

    fn with_name(mut self, name: &'a [u8]) -> Self {
        self.name = Some(name);
        self
    }

    fn with_content(mut self, content: Cow<'a, [u8]>) -> Self {
        self.content = Some(content);
        self
    }
}

/// Error raised in strict mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        ParseError {
            message: message.into(),
            position,
        }
    }
}

/// XML tokenizer implementing a pull-parser pattern
pub struct Tokenizer<'a> {
    scanner: Scanner<'a>,
    strict: bool,
    error: Option<ParseError>,
    finished: bool,
}

impl<'a> Tokenizer<'a> {
    /// Create a lenient tokenizer
    pub fn new(input: &'a [u8]) -> Self {
        Tokenizer {
            scanner: Scanner::new(input),
            strict: false,
            error: None,
            finished: false,
        }
    }

    /// Create a tokenizer that stops at the first well-formedness error
    pub fn new_strict(input: &'a [u8]) -> Self {
        Tokenizer {
            strict: true,
            ..Self::new(input)
        }
    }

    /// The error that stopped a strict tokenizer, if any
    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.scanner.position()
    }

    /// Produce the next token; `None` after `Eof` or after an error
    pub fn next_token(&mut self) -> Option<Token<'a>> {
        if self.finished {
            return None;
        }

        let start = self.scanner.position();
        if self.scanner.is_eof() {
            self.finished = true;
            return Some(Token::new(TokenKind::Eof, (start, start)));
        }

        let result = if self.scanner.peek() == Some(b'<') {
            self.read_markup(start)
        } else {
            self.read_text(start)
        };

        match result {
            Ok(token) => Some(token),
            Err(err) => {
                self.finished = true;
                self.error = Some(err);
                None
            }
        }
    }

    fn fail(&self, message: &str, position: usize) -> Result<(), ParseError> {
        if self.strict {
            Err(ParseError::new(message, position))
        } else {
            Ok(())
        }
    }

    fn read_text(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        let end = self.scanner.find_tag_start().unwrap_or(self.scanner.input_len());
        self.scanner.set_position(end);

        let raw = self.scanner.slice(start, end);
        let content = if self.strict {
            decode_text_strict(raw).map_err(|msg| ParseError::new(msg, start))?
        } else {
            decode_text(raw)
        };
        Ok(Token::new(TokenKind::Text, (start, end)).with_content(content))
    }

    fn read_markup(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        if self.scanner.starts_with(b"<!--") {
            return self.read_delimited(start, 4, b"-->", TokenKind::Comment, "Unterminated comment");
        }
        if self.scanner.starts_with(b"<![CDATA[") {
            return self.read_delimited(start, 9, b"]]>", TokenKind::CData, "Unterminated CDATA section");
        }
        if self.scanner.starts_with(b"<!DOCTYPE") {
            return self.read_doctype(start);
        }
        if self.scanner.starts_with(b"<?") {
            return self.read_processing_instruction(start);
        }
        if self.scanner.starts_with(b"</") {
            return self.read_end_tag(start);
        }
        self.read_start_tag(start)
    }

    /// Read a construct closed by a fixed terminator (comments, CDATA)
    fn read_delimited(
        &mut self,
        start: usize,
        open_len: usize,
        terminator: &[u8],
        kind: TokenKind,
        message: &str,
    ) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(open_len);
        let content_start = self.scanner.position();
        let (content_end, end) = match self.scanner.find_seq(terminator) {
            Some(pos) => (pos, pos + terminator.len()),
            None => {
                self.fail(message, start)?;
                let eof = self.scanner.input_len();
                (eof, eof)
            }
        };
        self.scanner.set_position(end);

        let content = Cow::Borrowed(self.scanner.slice(content_start, content_end));
        Ok(Token::new(kind, (start, end)).with_content(content))
    }

    fn read_doctype(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(9);
        let mut bracket_depth = 0usize;
        let mut quote: Option<u8> = None;

        while let Some(b) = self.scanner.peek() {
            self.scanner.advance(1);
            match (quote, b) {
                (Some(q), _) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'[') => bracket_depth += 1,
                (None, b']') => bracket_depth = bracket_depth.saturating_sub(1),
                (None, b'>') if bracket_depth == 0 => {
                    return Ok(Token::new(TokenKind::DocType, (start, self.scanner.position())));
                }
                _ => {}
            }
        }

        self.fail("Unterminated DOCTYPE declaration", start)?;
        let end = self.scanner.position();
        Ok(Token::new(TokenKind::DocType, (start, end)))
    }

    fn read_processing_instruction(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(2);
        let Some(target) = self.scanner.read_name() else {
            self.fail("Processing instruction target expected", start)?;
            return self.recover_as_text(start);
        };

        let data_start = self.scanner.position();
        let (data_end, end) = match self.scanner.find_seq(b"?>") {
            Some(pos) => (pos, pos + 2),
            None => {
                self.fail("Unterminated processing instruction", start)?;
                let eof = self.scanner.input_len();
                (eof, eof)
            }
        };
        self.scanner.set_position(end);

        let data = trim_leading_whitespace(self.scanner.slice(data_start, data_end));
        let kind = if target == b"xml" {
            if start != 0 {
                self.fail("XML declaration allowed only at the start of the document", start)?;
            }
            TokenKind::XmlDeclaration
        } else {
            TokenKind::ProcessingInstruction
        };

        Ok(Token::new(kind, (start, end))
            .with_name(target)
            .with_content(Cow::Borrowed(data)))
    }

    fn read_end_tag(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(2);
        let Some(name) = self.scanner.read_name() else {
            self.fail("Invalid end tag name", start)?;
            return self.recover_as_text(start);
        };
        self.scanner.skip_whitespace();

        if self.scanner.peek() == Some(b'>') {
            self.scanner.advance(1);
        } else {
            self.fail("Expected '>' to close end tag", self.scanner.position())?;
            match self.scanner.find_tag_end_quoted() {
                Some(pos) => self.scanner.set_position(pos + 1),
                None => self.scanner.set_position(self.scanner.input_len()),
            }
        }

        let end = self.scanner.position();
        Ok(Token::new(TokenKind::EndTag, (start, end)).with_name(name))
    }

    fn read_start_tag(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(1);
        let Some(name) = self.scanner.read_name() else {
            self.fail("Invalid element name", start)?;
            return self.recover_as_text(start);
        };

        let attrs_start = self.scanner.position();
        let Some(close) = self.scanner.find_tag_end_quoted() else {
            self.fail("Unterminated start tag", start)?;
            let end = self.scanner.input_len();
            self.scanner.set_position(end);
            let attrs = Cow::Borrowed(self.scanner.slice(attrs_start, end));
            return Ok(Token::new(TokenKind::StartTag, (start, end))
                .with_name(name)
                .with_content(attrs));
        };

        let empty = close > attrs_start && self.scanner.slice(close - 1, close) == b"/";
        let attrs_end = if empty { close - 1 } else { close };

        let attrs = self.scanner.slice(attrs_start, attrs_end);
        if let Some(&first) = attrs.first() {
            if !is_whitespace(first) {
                self.fail("Whitespace required between element name and attributes", attrs_start)?;
            }
        }

        self.scanner.set_position(close + 1);
        let kind = if empty { TokenKind::EmptyTag } else { TokenKind::StartTag };
        Ok(Token::new(kind, (start, close + 1))
            .with_name(name)
            .with_content(Cow::Borrowed(attrs)))
    }

    /// Lenient recovery for a stray '<': emit it as text and carry on
    fn recover_as_text(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.set_position(start + 1);
        let content = Cow::Borrowed(self.scanner.slice(start, start + 1));
        Ok(Token::new(TokenKind::Text, (start, start + 1)).with_content(content))
    }
}

fn trim_leading_whitespace(bytes: &[u8]) -> &[u8] {
    let skip = bytes.iter().take_while(|&&b| is_whitespace(b)).count();
    &bytes[skip..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &[u8]) -> Vec<TokenKind> {
        let mut tokenizer = Tokenizer::new(input);
        std::iter::from_fn(|| tokenizer.next_token()).map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_document() {
        assert_eq!(
            kinds(b"<root>hi</root>"),
            vec![TokenKind::StartTag, TokenKind::Text, TokenKind::EndTag, TokenKind::Eof]
        );
    }

    #[test]
    fn test_empty_tag_with_attributes() {
        let mut tokenizer = Tokenizer::new(b"<item id=\"1\" />");
        let token = tokenizer.next_token().unwrap();
        assert_eq!(token.kind, TokenKind::EmptyTag);
        assert_eq!(token.name, Some(b"item" as &[u8]));
        assert_eq!(token.content.as_deref(), Some(b" id=\"1\" " as &[u8]));
    }

    #[test]
    fn test_quoted_gt_in_attribute() {
        let mut tokenizer = Tokenizer::new(b"<a title=\"x > y\">");
        let token = tokenizer.next_token().unwrap();
        assert_eq!(token.kind, TokenKind::StartTag);
        assert_eq!(token.span, (0, 17));
    }

    #[test]
    fn test_declaration_comment_cdata_pi() {
        let input = b"<?xml version=\"1.0\"?><!--c--><r><![CDATA[<x>]]><?go now?></r>";
        assert_eq!(
            kinds(input),
            vec![
                TokenKind::XmlDeclaration,
                TokenKind::Comment,
                TokenKind::StartTag,
                TokenKind::CData,
                TokenKind::ProcessingInstruction,
                TokenKind::EndTag,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_doctype_with_internal_subset() {
        let input = b"<!DOCTYPE r [<!ELEMENT r ANY>]><r/>";
        assert_eq!(kinds(input), vec![TokenKind::DocType, TokenKind::EmptyTag, TokenKind::Eof]);
    }

    #[test]
    fn test_text_entities_decoded() {
        let mut tokenizer = Tokenizer::new(b"a &amp; b");
        let token = tokenizer.next_token().unwrap();
        assert_eq!(token.content.as_deref(), Some(b"a & b" as &[u8]));
    }

    #[test]
    fn test_strict_unterminated_comment() {
        let mut tokenizer = Tokenizer::new_strict(b"<r><!-- open");
        assert!(tokenizer.next_token().is_some());
        assert!(tokenizer.next_token().is_none());
        assert_eq!(tokenizer.error().map(|e| e.position), Some(3));
    }

    #[test]
    fn test_strict_invalid_tag_name() {
        let mut tokenizer = Tokenizer::new_strict(b"< r>");
        assert!(tokenizer.next_token().is_none());
        assert!(tokenizer.error().is_some());
    }

    #[test]
    fn test_lenient_stray_lt_is_text() {
        assert_eq!(
            kinds(b"a < b"),
            vec![TokenKind::Text, TokenKind::Text, TokenKind::Text, TokenKind::Eof]
        );
    }
}
