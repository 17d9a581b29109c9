//! CSS Selector Parser
//!
//! Recursive descent over the selector text, producing selector groups of
//! compound selectors joined by combinators.

use super::CssError;

/// One comma-separated alternative
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSelector {
    pub first: CompoundSelector,
    pub rest: Vec<(Combinator, CompoundSelector)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// whitespace
    Descendant,
    /// `>`
    Child,
    /// `+`
    Adjacent,
    /// `~`
    GeneralSibling,
}

/// Type selector plus the simple selectors attached to it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundSelector {
    /// `None` for `*` or an omitted type selector
    pub element: Option<String>,
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Id(String),
    Class(String),
    Attribute {
        name: String,
        matcher: Option<(AttrOp, String)>,
    },
    Pseudo(Pseudo),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    /// `=`
    Equals,
    /// `~=`
    Includes,
    /// `|=`
    DashMatch,
    /// `^=`
    Prefix,
    /// `$=`
    Suffix,
    /// `*=`
    Substring,
    /// `!=`
    NotEquals,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pseudo {
    FirstChild,
    LastChild,
    OnlyChild,
    FirstOfType,
    LastOfType,
    OnlyOfType,
    Empty,
    Root,
    NthChild(Nth),
    NthLastChild(Nth),
    NthOfType(Nth),
    NthLastOfType(Nth),
    Not(Box<CompoundSelector>),
    Contains(String),
}

/// `an+b`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nth {
    pub a: i64,
    pub b: i64,
}

impl Nth {
    /// Parse the argument of an `:nth-*` pseudo-class
    pub fn parse(text: &str) -> Option<Nth> {
        let compact: String = text
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();

        match compact.as_str() {
            "" => return None,
            "odd" => return Some(Nth { a: 2, b: 1 }),
            "even" => return Some(Nth { a: 2, b: 0 }),
            _ => {}
        }

        match compact.split_once('n') {
            Some((a, b)) => {
                let a = match a {
                    "" | "+" => 1,
                    "-" => -1,
                    _ => parse_signed(a)?,
                };
                let b = if b.is_empty() {
                    0
                } else if b.starts_with('+') || b.starts_with('-') {
                    parse_signed(b)?
                } else {
                    return None;
                };
                Some(Nth { a, b })
            }
            None => Some(Nth {
                a: 0,
                b: parse_signed(&compact)?,
            }),
        }
    }
}

fn parse_signed(text: &str) -> Option<i64> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Selector parser
pub struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Parser { input, pos: 0 }
    }

    /// Parse a full selector group
    pub fn parse(mut self) -> Result<Vec<ComplexSelector>, CssError> {
        self.skip_whitespace();
        if self.is_eof() {
            return Err(CssError::Empty);
        }

        let mut group = vec![self.parse_complex()?];
        while self.eat(',') {
            self.skip_whitespace();
            group.push(self.parse_complex()?);
        }

        match self.peek() {
            None => Ok(group),
            Some(c) => Err(self.unexpected(c)),
        }
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, CssError> {
        let first = self.parse_compound()?;
        let mut rest = Vec::new();

        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::Adjacent,
                Some('~') => Combinator::GeneralSibling,
                Some(_) if had_space => Combinator::Descendant,
                Some(c) => return Err(self.unexpected(c)),
            };
            if combinator != Combinator::Descendant {
                self.pos += 1;
                self.skip_whitespace();
            }
            rest.push((combinator, self.parse_compound()?));
        }

        Ok(ComplexSelector { first, rest })
    }

    fn parse_compound(&mut self) -> Result<CompoundSelector, CssError> {
        let mut compound = CompoundSelector::default();
        let mut consumed = false;

        if self.eat('*') {
            consumed = true;
            if self.peek() == Some('|') && self.peek_at(1) != Some('=') {
                self.pos += 1;
                compound.element = self.parse_type_name()?;
            }
        } else if self.at_ident_start() {
            consumed = true;
            let name = self.parse_ident()?;
            if self.peek() == Some('|') && self.peek_at(1) != Some('=') {
                self.pos += 1;
                compound.element = self.parse_type_name()?.map(|local| format!("{}:{}", name, local));
            } else {
                compound.element = Some(name);
            }
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.conditions.push(Condition::Id(self.parse_ident()?));
                }
                Some('.') => {
                    self.pos += 1;
                    compound.conditions.push(Condition::Class(self.parse_ident()?));
                }
                Some('[') => {
                    self.pos += 1;
                    compound.conditions.push(self.parse_attribute()?);
                }
                Some(':') => {
                    self.pos += 1;
                    compound.conditions.push(Condition::Pseudo(self.parse_pseudo()?));
                }
                _ => break,
            }
            consumed = true;
        }

        if !consumed {
            return Err(match self.peek() {
                Some(c) => self.unexpected(c),
                None => CssError::UnexpectedEnd,
            });
        }
        Ok(compound)
    }

    /// Name after `ns|`; `*` means any
    fn parse_type_name(&mut self) -> Result<Option<String>, CssError> {
        if self.eat('*') {
            Ok(None)
        } else {
            self.parse_ident().map(Some)
        }
    }

    fn parse_attribute(&mut self) -> Result<Condition, CssError> {
        self.skip_whitespace();
        let mut name = self.parse_ident()?;
        if self.peek() == Some('|') && self.peek_at(1) != Some('=') {
            self.pos += 1;
            name = format!("{}:{}", name, self.parse_ident()?);
        }
        self.skip_whitespace();

        if self.eat(']') {
            return Ok(Condition::Attribute { name, matcher: None });
        }

        let op = match (self.peek(), self.peek_at(1)) {
            (Some('='), _) => AttrOp::Equals,
            (Some('~'), Some('=')) => AttrOp::Includes,
            (Some('|'), Some('=')) => AttrOp::DashMatch,
            (Some('^'), Some('=')) => AttrOp::Prefix,
            (Some('$'), Some('=')) => AttrOp::Suffix,
            (Some('*'), Some('=')) => AttrOp::Substring,
            (Some('!'), Some('=')) => AttrOp::NotEquals,
            (Some(c), _) => return Err(self.unexpected(c)),
            (None, _) => return Err(CssError::UnexpectedEnd),
        };
        self.pos += if op == AttrOp::Equals { 1 } else { 2 };
        self.skip_whitespace();

        let value = self.parse_string_or_ident()?;
        self.skip_whitespace();
        self.expect(']')?;

        Ok(Condition::Attribute {
            name,
            matcher: Some((op, value)),
        })
    }

    fn parse_pseudo(&mut self) -> Result<Pseudo, CssError> {
        if self.peek() == Some(':') {
            self.pos += 1;
            let name = self.parse_ident()?;
            return Err(CssError::Unsupported(format!("::{}", name)));
        }

        let name = self.parse_ident()?.to_ascii_lowercase();

        if !self.eat('(') {
            return match name.as_str() {
                "first-child" => Ok(Pseudo::FirstChild),
                "last-child" => Ok(Pseudo::LastChild),
                "only-child" => Ok(Pseudo::OnlyChild),
                "first-of-type" => Ok(Pseudo::FirstOfType),
                "last-of-type" => Ok(Pseudo::LastOfType),
                "only-of-type" => Ok(Pseudo::OnlyOfType),
                "empty" => Ok(Pseudo::Empty),
                "root" => Ok(Pseudo::Root),
                _ => Err(CssError::Unsupported(format!(":{}", name))),
            };
        }

        self.skip_whitespace();
        let pseudo = match name.as_str() {
            "nth-child" | "nth-last-child" | "nth-of-type" | "nth-last-of-type" => {
                let start = self.pos;
                let len = self.remaining().find(')').ok_or(CssError::UnexpectedEnd)?;
                self.pos += len;
                let argument = &self.input[start..start + len];
                let nth = Nth::parse(argument).ok_or_else(|| CssError::InvalidNth(argument.trim().to_string()))?;
                match name.as_str() {
                    "nth-child" => Pseudo::NthChild(nth),
                    "nth-last-child" => Pseudo::NthLastChild(nth),
                    "nth-of-type" => Pseudo::NthOfType(nth),
                    _ => Pseudo::NthLastOfType(nth),
                }
            }
            "not" => {
                let inner = self.parse_compound()?;
                if inner.conditions.iter().any(|c| matches!(c, Condition::Pseudo(Pseudo::Not(_)))) {
                    return Err(CssError::Unsupported(":not() nested in :not()".to_string()));
                }
                Pseudo::Not(Box::new(inner))
            }
            "contains" => Pseudo::Contains(self.parse_string_or_ident()?),
            _ => return Err(CssError::Unsupported(format!(":{}()", name))),
        };
        self.skip_whitespace();
        self.expect(')')?;
        Ok(pseudo)
    }

    fn parse_string_or_ident(&mut self) -> Result<String, CssError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => self.parse_string(quote),
            Some(_) => self.parse_ident(),
            None => Err(CssError::UnexpectedEnd),
        }
    }

    fn parse_string(&mut self, quote: char) -> Result<String, CssError> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(value),
                Some('\\') => match self.bump() {
                    Some(escaped) => value.push(escaped),
                    None => break,
                },
                Some(c) => value.push(c),
                None => break,
            }
        }
        Err(CssError::UnterminatedString { offset: start })
    }

    fn parse_ident(&mut self) -> Result<String, CssError> {
        if !self.at_ident_start() {
            return Err(match self.peek() {
                Some(c) => self.unexpected(c),
                None => CssError::UnexpectedEnd,
            });
        }

        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                match self.bump() {
                    Some(escaped) => ident.push(escaped),
                    None => return Err(CssError::UnexpectedEnd),
                }
            } else if is_ident_char(c) {
                ident.push(c);
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        Ok(ident)
    }

    fn at_ident_start(&self) -> bool {
        match self.peek() {
            Some('-') => matches!(self.peek_at(1), Some(c) if is_ident_start(c) || c == '-' || c == '\\'),
            Some('\\') => true,
            Some(c) => is_ident_start(c),
            None => false,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.remaining().chars().nth(offset)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), CssError> {
        if self.eat(expected) {
            return Ok(());
        }
        Err(match self.peek() {
            Some(c) => self.unexpected(c),
            None => CssError::UnexpectedEnd,
        })
    }

    /// Returns whether any whitespace was skipped
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
        self.pos > start
    }

    fn unexpected(&self, found: char) -> CssError {
        CssError::UnexpectedChar {
            found,
            offset: self.pos,
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit() || c == '-'
}

/// Parse a selector group
pub fn parse(selector: &str) -> Result<Vec<ComplexSelector>, CssError> {
    Parser::new(selector).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(selector: &str) -> ComplexSelector {
        let mut group = parse(selector).unwrap();
        assert_eq!(group.len(), 1, "{}", selector);
        group.remove(0)
    }

    #[test]
    fn test_type_and_simple_selectors() {
        let sel = single("item#main.big[lang]");
        assert_eq!(sel.first.element.as_deref(), Some("item"));
        assert_eq!(
            sel.first.conditions,
            vec![
                Condition::Id("main".to_string()),
                Condition::Class("big".to_string()),
                Condition::Attribute {
                    name: "lang".to_string(),
                    matcher: None
                },
            ]
        );
        assert!(sel.rest.is_empty());
    }

    #[test]
    fn test_universal_and_namespaced_types() {
        assert_eq!(single("*").first.element, None);
        assert_eq!(single("svg|rect").first.element.as_deref(), Some("svg:rect"));
        assert_eq!(single("*|rect").first.element.as_deref(), Some("rect"));
    }

    #[test]
    fn test_combinators() {
        let sel = single("a > b + c ~ d e");
        let combinators: Vec<_> = sel.rest.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            combinators,
            vec![
                Combinator::Child,
                Combinator::Adjacent,
                Combinator::GeneralSibling,
                Combinator::Descendant
            ]
        );

        let tight = single("a>b");
        assert_eq!(tight.rest[0].0, Combinator::Child);
    }

    #[test]
    fn test_attribute_operators() {
        let cases = [
            ("[a=v]", AttrOp::Equals),
            ("[a~=v]", AttrOp::Includes),
            ("[a|=v]", AttrOp::DashMatch),
            ("[a^=v]", AttrOp::Prefix),
            ("[a$=v]", AttrOp::Suffix),
            ("[a*=v]", AttrOp::Substring),
            ("[a!=v]", AttrOp::NotEquals),
        ];
        for (selector, expected) in cases {
            match &single(selector).first.conditions[0] {
                Condition::Attribute {
                    matcher: Some((op, value)),
                    ..
                } => {
                    assert_eq!(*op, expected, "{}", selector);
                    assert_eq!(value, "v");
                }
                other => panic!("{}: {:?}", selector, other),
            }
        }
    }

    #[test]
    fn test_quoted_attribute_values() {
        let sel = single(r#"[title = "a \"b\" c"]"#);
        assert_eq!(
            sel.first.conditions[0],
            Condition::Attribute {
                name: "title".to_string(),
                matcher: Some((AttrOp::Equals, r#"a "b" c"#.to_string()))
            }
        );
    }

    #[test]
    fn test_pseudo_classes() {
        let sel = single("li:first-child:nth-child(2n+1):not(.x):contains('hi')");
        assert_eq!(
            sel.first.conditions,
            vec![
                Condition::Pseudo(Pseudo::FirstChild),
                Condition::Pseudo(Pseudo::NthChild(Nth { a: 2, b: 1 })),
                Condition::Pseudo(Pseudo::Not(Box::new(CompoundSelector {
                    element: None,
                    conditions: vec![Condition::Class("x".to_string())],
                }))),
                Condition::Pseudo(Pseudo::Contains("hi".to_string())),
            ]
        );
    }

    #[test]
    fn test_nth_forms() {
        assert_eq!(Nth::parse("odd"), Some(Nth { a: 2, b: 1 }));
        assert_eq!(Nth::parse("EVEN"), Some(Nth { a: 2, b: 0 }));
        assert_eq!(Nth::parse("3"), Some(Nth { a: 0, b: 3 }));
        assert_eq!(Nth::parse("n"), Some(Nth { a: 1, b: 0 }));
        assert_eq!(Nth::parse("-n + 3"), Some(Nth { a: -1, b: 3 }));
        assert_eq!(Nth::parse("3n-2"), Some(Nth { a: 3, b: -2 }));
        assert_eq!(Nth::parse(""), None);
        assert_eq!(Nth::parse("2n3"), None);
        assert_eq!(Nth::parse("x"), None);
    }

    #[test]
    fn test_groups() {
        let group = parse("a, b ,c").unwrap();
        assert_eq!(group.len(), 3);
        assert_eq!(group[2].first.element.as_deref(), Some("c"));
    }

    #[test]
    fn test_rejects_xpath_and_garbage() {
        for selector in ["", "   ", "//item[1]", "/root", "a >", "a,", "[a", "[a=]", "a:hover", "p::before", "a:nth-child(x)", "'q"] {
            assert!(parse(selector).is_err(), "{:?} should not parse", selector);
        }
    }
}
