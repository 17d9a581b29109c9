//! XPath Lexer
//!
//! Tokenizes XPath expressions into tokens.
//!
//! `and`, `or`, `div`, `mod` are only operators directly after an operand,
//! so `//div` still names an element.

/// XPath token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Operators
    Slash,       // /
    DoubleSlash, // //
    Dot,         // .
    DoubleDot,   // ..
    At,          // @
    Pipe,        // |
    Plus,        // +
    Minus,       // -
    Star,        // *
    Eq,          // =
    NotEq,       // !=
    Lt,          // <
    LtEq,        // <=
    Gt,          // >
    GtEq,        // >=
    And,         // and
    Or,          // or
    Mod,         // mod
    Div,         // div

    // Brackets
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]

    // Literals
    Number(f64),
    String(String),

    // Names
    Name(String),     // NCName
    NameTest(String), // prefix:* or prefix:local
    NodeType(String), // node(), text(), comment(), processing-instruction()

    // Axis
    Axis(String), // child::, descendant::, etc.

    // Special
    DoubleColon, // ::
    Comma,       // ,
    Dollar,      // $

    /// Unlexable input; no grammar rule accepts it
    Invalid(String),

    // End of input
    Eof,
}

/// XPath lexer
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    after_operand: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            pos: 0,
            after_operand: false,
        }
    }

    /// Get the remaining input
    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Peek at current character
    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Peek at character at offset
    fn peek_at(&self, offset: usize) -> Option<char> {
        self.remaining().chars().nth(offset)
    }

    /// Advance by n bytes
    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    /// Skip whitespace
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        let token = self.scan_token();
        self.after_operand = match &token {
            Token::Name(_)
            | Token::NameTest(_)
            | Token::Number(_)
            | Token::String(_)
            | Token::RightParen
            | Token::RightBracket
            | Token::Dot
            | Token::DoubleDot => true,
            // `*` after an operand is multiplication, otherwise a name test
            Token::Star => !self.after_operand,
            _ => false,
        };
        token
    }

    fn scan_token(&mut self) -> Token {
        self.skip_whitespace();

        let c = match self.peek() {
            Some(c) => c,
            None => return Token::Eof,
        };

        match c {
            '/' => {
                self.advance(1);
                if self.peek() == Some('/') {
                    self.advance(1);
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            }
            '.' => {
                if self.peek_at(1).map(|c| c.is_ascii_digit()).unwrap_or(false) {
                    return self.read_number();
                }
                self.advance(1);
                if self.peek() == Some('.') {
                    self.advance(1);
                    Token::DoubleDot
                } else {
                    Token::Dot
                }
            }
            '@' => {
                self.advance(1);
                Token::At
            }
            '|' => {
                self.advance(1);
                Token::Pipe
            }
            '+' => {
                self.advance(1);
                Token::Plus
            }
            '-' => {
                self.advance(1);
                Token::Minus
            }
            '*' => {
                self.advance(1);
                Token::Star
            }
            '=' => {
                self.advance(1);
                Token::Eq
            }
            '!' => {
                self.advance(1);
                if self.peek() == Some('=') {
                    self.advance(1);
                    Token::NotEq
                } else {
                    Token::Invalid("!".to_string())
                }
            }
            '<' => {
                self.advance(1);
                if self.peek() == Some('=') {
                    self.advance(1);
                    Token::LtEq
                } else {
                    Token::Lt
                }
            }
            '>' => {
                self.advance(1);
                if self.peek() == Some('=') {
                    self.advance(1);
                    Token::GtEq
                } else {
                    Token::Gt
                }
            }
            '(' => {
                self.advance(1);
                Token::LeftParen
            }
            ')' => {
                self.advance(1);
                Token::RightParen
            }
            '[' => {
                self.advance(1);
                Token::LeftBracket
            }
            ']' => {
                self.advance(1);
                Token::RightBracket
            }
            ',' => {
                self.advance(1);
                Token::Comma
            }
            '$' => {
                self.advance(1);
                Token::Dollar
            }
            ':' => {
                self.advance(1);
                if self.peek() == Some(':') {
                    self.advance(1);
                    Token::DoubleColon
                } else {
                    Token::Invalid(":".to_string())
                }
            }
            '"' | '\'' => self.read_string(c),
            '0'..='9' => self.read_number(),
            _ if is_name_start_char(c) => self.read_name_or_keyword(),
            _ => {
                self.advance(c.len_utf8());
                Token::Invalid(c.to_string())
            }
        }
    }

    /// Read a number literal
    fn read_number(&mut self) -> Token {
        let start = self.pos;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance(1);
            } else {
                break;
            }
        }

        if self.peek() == Some('.') {
            self.advance(1);
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    self.advance(1);
                } else {
                    break;
                }
            }
        }

        let num_str = &self.input[start..self.pos];
        let value = num_str.parse().unwrap_or(f64::NAN);
        Token::Number(value)
    }

    /// Read a string literal; there are no escapes, only the other quote
    fn read_string(&mut self, quote: char) -> Token {
        self.advance(1);
        let start = self.pos;

        match self.remaining().find(quote) {
            Some(len) => {
                let value = self.input[start..start + len].to_string();
                self.advance(len + 1);
                Token::String(value)
            }
            None => {
                self.pos = self.input.len();
                Token::Invalid(format!("unterminated string literal at {}", start - 1))
            }
        }
    }

    fn read_ncname(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_name_char(c) {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
        &self.input[start..self.pos]
    }

    /// Read a name or keyword
    fn read_name_or_keyword(&mut self) -> Token {
        let name = self.read_ncname();

        if self.after_operand {
            match name {
                "and" => return Token::And,
                "or" => return Token::Or,
                "mod" => return Token::Mod,
                "div" => return Token::Div,
                _ => {}
            }
        }

        // prefix:local or prefix:*
        if self.peek() == Some(':') && self.peek_at(1) != Some(':') {
            self.advance(1);
            if self.peek() == Some('*') {
                self.advance(1);
                return Token::NameTest(format!("{}:*", name));
            }
            if !self.peek().map(is_name_start_char).unwrap_or(false) {
                return Token::Invalid(format!("{}:", name));
            }
            let local = self.read_ncname();
            return Token::NameTest(format!("{}:{}", name, local));
        }

        // Lookahead past whitespace for an axis or a call
        let save = self.pos;
        self.skip_whitespace();
        if self.remaining().starts_with("::") {
            return Token::Axis(name.to_string());
        }
        if self.peek() == Some('(') {
            return match name {
                "node" | "text" | "comment" | "processing-instruction" => Token::NodeType(name.to_string()),
                _ => Token::Name(name.to_string()),
            };
        }
        self.pos = save;
        Token::Name(name.to_string())
    }

    /// Tokenize entire input
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            if matches!(token, Token::Eof) {
                break;
            }
            tokens.push(token);
        }
        tokens
    }
}

fn is_name_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_path() {
        let mut lexer = Lexer::new("/root/child");
        assert_eq!(lexer.next_token(), Token::Slash);
        assert_eq!(lexer.next_token(), Token::Name("root".to_string()));
        assert_eq!(lexer.next_token(), Token::Slash);
        assert_eq!(lexer.next_token(), Token::Name("child".to_string()));
        assert_eq!(lexer.next_token(), Token::Eof);
    }

    #[test]
    fn test_descendant() {
        let mut lexer = Lexer::new("//item");
        assert_eq!(lexer.next_token(), Token::DoubleSlash);
        assert_eq!(lexer.next_token(), Token::Name("item".to_string()));
    }

    #[test]
    fn test_predicate() {
        let mut lexer = Lexer::new("item[@id='test']");
        assert_eq!(lexer.next_token(), Token::Name("item".to_string()));
        assert_eq!(lexer.next_token(), Token::LeftBracket);
        assert_eq!(lexer.next_token(), Token::At);
        assert_eq!(lexer.next_token(), Token::Name("id".to_string()));
        assert_eq!(lexer.next_token(), Token::Eq);
        assert_eq!(lexer.next_token(), Token::String("test".to_string()));
        assert_eq!(lexer.next_token(), Token::RightBracket);
    }

    #[test]
    fn test_axis() {
        let mut lexer = Lexer::new("child::element");
        assert_eq!(lexer.next_token(), Token::Axis("child".to_string()));
        assert_eq!(lexer.next_token(), Token::DoubleColon);
        assert_eq!(lexer.next_token(), Token::Name("element".to_string()));
    }

    #[test]
    fn test_number() {
        let mut lexer = Lexer::new("position() = 1");
        let tokens = lexer.tokenize();
        assert!(matches!(tokens.last(), Some(Token::Number(n)) if *n == 1.0));

        let tokens = Lexer::new(".5 + 2.").tokenize();
        assert_eq!(tokens, vec![Token::Number(0.5), Token::Plus, Token::Number(2.0)]);
    }

    #[test]
    fn test_operator_names_depend_on_position() {
        let tokens = Lexer::new("//div[a and b] div 2").tokenize();
        assert_eq!(tokens[1], Token::Name("div".to_string()));
        assert_eq!(tokens[4], Token::And);
        assert_eq!(tokens[7], Token::Div);

        let tokens = Lexer::new("descendant-or-self::or").tokenize();
        assert_eq!(tokens[2], Token::Name("or".to_string()));
    }

    #[test]
    fn test_star_after_operand_is_still_star() {
        let tokens = Lexer::new("2 * count(*)").tokenize();
        assert_eq!(tokens[1], Token::Star);
        assert_eq!(tokens[4], Token::Star);
    }

    #[test]
    fn test_qualified_names() {
        let tokens = Lexer::new("svg:rect | svg:*").tokenize();
        assert_eq!(tokens[0], Token::NameTest("svg:rect".to_string()));
        assert_eq!(tokens[2], Token::NameTest("svg:*".to_string()));
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(Lexer::new("'open").next_token(), Token::Invalid(_)));
        assert!(matches!(Lexer::new("#").next_token(), Token::Invalid(_)));
        assert!(matches!(Lexer::new("a ! b").tokenize()[1], Token::Invalid(_)));
        assert!(matches!(Lexer::new("p:").next_token(), Token::Invalid(_)));
    }
}
