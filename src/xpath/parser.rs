//! XPath Parser
//!
//! Recursive descent parser for XPath 1.0 expressions.

use super::lexer::{Lexer, Token};

/// XPath expression AST node
#[derive(Debug, Clone)]
pub enum Expr {
    /// Root path (/)
    Root,
    /// Union of two expressions (|)
    Union(Box<Expr>, Box<Expr>),
    /// Path expression (expr/step or expr//step)
    Path(Box<Expr>, Box<Step>),
    /// Filter expression with predicate
    Filter(Box<Expr>, Box<Expr>),
    /// Function call
    Function(String, Vec<Expr>),
    /// Binary operation
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    /// Unary negation
    Negate(Box<Expr>),
    /// Literal number
    Number(f64),
    /// Literal string
    String(String),
    /// Location step relative to the context node
    Step(Box<Step>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Location step in a path
#[derive(Debug, Clone)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    fn bare(axis: Axis, node_test: NodeTest) -> Self {
        Step {
            axis,
            node_test,
            predicates: Vec::new(),
        }
    }

    /// The `descendant-or-self::node()` step that `//` abbreviates
    fn descendant_or_self() -> Self {
        Step::bare(Axis::DescendantOrSelf, NodeTest::Node)
    }
}

/// XPath axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    Self_,
    Attribute,
    Namespace,
}

impl Axis {
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "child" => Some(Axis::Child),
            "descendant" => Some(Axis::Descendant),
            "descendant-or-self" => Some(Axis::DescendantOrSelf),
            "parent" => Some(Axis::Parent),
            "ancestor" => Some(Axis::Ancestor),
            "ancestor-or-self" => Some(Axis::AncestorOrSelf),
            "following-sibling" => Some(Axis::FollowingSibling),
            "preceding-sibling" => Some(Axis::PrecedingSibling),
            "following" => Some(Axis::Following),
            "preceding" => Some(Axis::Preceding),
            "self" => Some(Axis::Self_),
            "attribute" => Some(Axis::Attribute),
            "namespace" => Some(Axis::Namespace),
            _ => None,
        }
    }
}

/// Node test in a location step
#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    /// Matches any element (*)
    Any,
    /// Matches elements with name
    Name(String),
    /// Matches prefix:localname
    QName(String, String),
    /// Matches prefix:*
    NamespaceWildcard(String),
    /// node() - matches any node
    Node,
    /// text() - matches text nodes
    Text,
    /// comment() - matches comments
    Comment,
    /// processing-instruction() - matches PIs
    ProcessingInstruction(Option<String>),
}

/// XPath parser
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peeked: Option<Token>,
}

impl<'a> Parser<'a> {
    /// Create a new parser
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Parser {
            lexer,
            current,
            peeked: None,
        }
    }

    /// Parse a complete XPath expression; leftover input is an error
    pub fn parse(&mut self) -> Result<Expr, String> {
        let expr = self.parse_expr()?;
        match &self.current {
            Token::Eof => Ok(expr),
            token => Err(unexpected(token)),
        }
    }

    /// Advance to next token
    fn advance(&mut self) {
        self.current = match self.peeked.take() {
            Some(t) => t,
            None => self.lexer.next_token(),
        };
    }

    /// Peek at next token
    fn peek(&mut self) -> &Token {
        let lexer = &mut self.lexer;
        self.peeked.get_or_insert_with(|| lexer.next_token())
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<(), String> {
        if self.current == token {
            self.advance();
            Ok(())
        } else {
            Err(format!("Expected {}, got {}", what, describe(&self.current)))
        }
    }

    /// Parse expression
    fn parse_expr(&mut self) -> Result<Expr, String> {
        self.parse_or_expr()
    }

    /// Parse or expression
    fn parse_or_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_and_expr()?;

        while matches!(self.current, Token::Or) {
            self.advance();
            let right = self.parse_and_expr()?;
            left = Expr::Binary(Box::new(left), BinaryOp::Or, Box::new(right));
        }

        Ok(left)
    }

    /// Parse and expression
    fn parse_and_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_equality_expr()?;

        while matches!(self.current, Token::And) {
            self.advance();
            let right = self.parse_equality_expr()?;
            left = Expr::Binary(Box::new(left), BinaryOp::And, Box::new(right));
        }

        Ok(left)
    }

    /// Parse equality expression
    fn parse_equality_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_relational_expr()?;

        loop {
            let op = match &self.current {
                Token::Eq => BinaryOp::Eq,
                Token::NotEq => BinaryOp::NotEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }

        Ok(left)
    }

    /// Parse relational expression
    fn parse_relational_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_additive_expr()?;

        loop {
            let op = match &self.current {
                Token::Lt => BinaryOp::Lt,
                Token::LtEq => BinaryOp::LtEq,
                Token::Gt => BinaryOp::Gt,
                Token::GtEq => BinaryOp::GtEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }

        Ok(left)
    }

    /// Parse additive expression
    fn parse_additive_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_multiplicative_expr()?;

        loop {
            let op = match &self.current {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }

        Ok(left)
    }

    /// Parse multiplicative expression
    fn parse_multiplicative_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_unary_expr()?;

        loop {
            let op = match &self.current {
                Token::Star => BinaryOp::Mul,
                Token::Div => BinaryOp::Div,
                Token::Mod => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }

        Ok(left)
    }

    /// Parse unary expression
    fn parse_unary_expr(&mut self) -> Result<Expr, String> {
        if matches!(self.current, Token::Minus) {
            self.advance();
            let expr = self.parse_unary_expr()?;
            Ok(Expr::Negate(Box::new(expr)))
        } else {
            self.parse_union_expr()
        }
    }

    /// Parse union expression
    fn parse_union_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_path_expr()?;

        while matches!(self.current, Token::Pipe) {
            self.advance();
            let right = self.parse_path_expr()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    /// Parse path expression
    fn parse_path_expr(&mut self) -> Result<Expr, String> {
        let expr = match &self.current {
            Token::Slash => {
                self.advance();
                if !self.at_step_start() {
                    return Ok(Expr::Root);
                }
                let step = self.parse_step()?;
                Expr::Path(Box::new(Expr::Root), Box::new(step))
            }
            Token::DoubleSlash => {
                self.advance();
                let step = self.parse_step()?;
                Expr::Path(
                    Box::new(Expr::Path(Box::new(Expr::Root), Box::new(Step::descendant_or_self()))),
                    Box::new(step),
                )
            }
            _ => return self.parse_filter_expr(),
        };

        self.parse_path_continuation(expr)
    }

    /// Parse `/step` and `//step` continuations of a path
    fn parse_path_continuation(&mut self, mut expr: Expr) -> Result<Expr, String> {
        loop {
            match &self.current {
                Token::Slash => {
                    self.advance();
                    let step = self.parse_step()?;
                    expr = Expr::Path(Box::new(expr), Box::new(step));
                }
                Token::DoubleSlash => {
                    self.advance();
                    let step = self.parse_step()?;
                    expr = Expr::Path(
                        Box::new(Expr::Path(Box::new(expr), Box::new(Step::descendant_or_self()))),
                        Box::new(step),
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Parse filter expression: a primary with predicates, then path steps
    fn parse_filter_expr(&mut self) -> Result<Expr, String> {
        let mut expr = self.parse_primary_expr()?;

        while matches!(self.current, Token::LeftBracket) {
            self.advance();
            let pred = self.parse_expr()?;
            self.expect(Token::RightBracket, "]")?;
            expr = Expr::Filter(Box::new(expr), Box::new(pred));
        }

        self.parse_path_continuation(expr)
    }

    /// Parse primary expression
    fn parse_primary_expr(&mut self) -> Result<Expr, String> {
        let is_call = matches!(self.current, Token::Name(_)) && matches!(self.peek(), Token::LeftParen);
        match &self.current {
            Token::Number(n) => {
                let n = *n;
                self.advance();
                Ok(Expr::Number(n))
            }
            Token::String(s) => {
                let s = s.clone();
                self.advance();
                Ok(Expr::String(s))
            }
            Token::Dollar => Err("Variable references are not supported".to_string()),
            Token::LeftParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(Token::RightParen, ")")?;
                Ok(expr)
            }
            Token::Name(name) if is_call => {
                let name = name.clone();
                self.advance();
                self.advance(); // Skip (
                let args = self.parse_function_args()?;
                Ok(Expr::Function(name, args))
            }
            _ if self.at_step_start() => {
                let step = self.parse_step()?;
                Ok(Expr::Step(Box::new(step)))
            }
            token => Err(unexpected(token)),
        }
    }

    /// Whether the current token can begin a location step
    fn at_step_start(&self) -> bool {
        matches!(
            self.current,
            Token::Name(_)
                | Token::NameTest(_)
                | Token::NodeType(_)
                | Token::Star
                | Token::At
                | Token::Axis(_)
                | Token::Dot
                | Token::DoubleDot
        )
    }

    /// Parse a location step
    fn parse_step(&mut self) -> Result<Step, String> {
        // Abbreviated steps take no predicates
        match self.current {
            Token::Dot => {
                self.advance();
                return Ok(Step::bare(Axis::Self_, NodeTest::Node));
            }
            Token::DoubleDot => {
                self.advance();
                return Ok(Step::bare(Axis::Parent, NodeTest::Node));
            }
            _ => {}
        }

        let mut axis = Axis::Child;
        if matches!(self.current, Token::At) {
            axis = Axis::Attribute;
            self.advance();
        } else if let Token::Axis(axis_name) = &self.current {
            axis = Axis::from_name(axis_name).ok_or_else(|| format!("Unknown axis: {}", axis_name))?;
            self.advance();
            self.expect(Token::DoubleColon, "::")?;
        }

        let node_test = self.parse_node_test()?;

        let mut predicates = Vec::new();
        while matches!(self.current, Token::LeftBracket) {
            self.advance();
            predicates.push(self.parse_expr()?);
            self.expect(Token::RightBracket, "]")?;
        }

        Ok(Step {
            axis,
            node_test,
            predicates,
        })
    }

    fn parse_node_test(&mut self) -> Result<NodeTest, String> {
        let node_test = match &self.current {
            Token::Star => NodeTest::Any,
            Token::Name(name) => NodeTest::Name(name.clone()),
            Token::NameTest(qname) => match qname.split_once(':') {
                Some((prefix, "*")) => NodeTest::NamespaceWildcard(prefix.to_string()),
                Some((prefix, local)) => NodeTest::QName(prefix.to_string(), local.to_string()),
                None => NodeTest::Name(qname.clone()),
            },
            Token::NodeType(name) => {
                let name = name.clone();
                self.advance();
                self.expect(Token::LeftParen, "(")?;
                let arg = match &self.current {
                    Token::String(s) if name == "processing-instruction" => {
                        let s = s.clone();
                        self.advance();
                        Some(s)
                    }
                    _ => None,
                };
                self.expect(Token::RightParen, ")")?;

                return Ok(match name.as_str() {
                    "node" => NodeTest::Node,
                    "text" => NodeTest::Text,
                    "comment" => NodeTest::Comment,
                    _ => NodeTest::ProcessingInstruction(arg),
                });
            }
            token => return Err(format!("Expected node test, got {}", describe(token))),
        };
        self.advance();
        Ok(node_test)
    }

    /// Parse function arguments
    fn parse_function_args(&mut self) -> Result<Vec<Expr>, String> {
        let mut args = Vec::new();

        if !matches!(self.current, Token::RightParen) {
            args.push(self.parse_expr()?);

            while matches!(self.current, Token::Comma) {
                self.advance();
                args.push(self.parse_expr()?);
            }
        }

        self.expect(Token::RightParen, ")")?;
        Ok(args)
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Eof => "end of expression".to_string(),
        Token::Invalid(text) => format!("invalid input {:?}", text),
        other => format!("{:?}", other),
    }
}

fn unexpected(token: &Token) -> String {
    format!("Unexpected {}", describe(token))
}

/// Parse an XPath expression string
pub fn parse(input: &str) -> Result<Expr, String> {
    Parser::new(input).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_path() {
        let expr = parse("/root/child").unwrap();
        assert!(matches!(expr, Expr::Path(..)));
    }

    #[test]
    fn test_predicate_stays_on_step() {
        match parse("item[@id='test']").unwrap() {
            Expr::Step(step) => assert_eq!(step.predicates.len(), 1),
            other => panic!("expected step, got {:?}", other),
        }
    }

    #[test]
    fn test_filter_on_parenthesized_path() {
        assert!(matches!(parse("(//item)[1]").unwrap(), Expr::Filter(..)));
    }

    #[test]
    fn test_descendant() {
        let expr = parse("//item").unwrap();
        assert!(matches!(expr, Expr::Path(..)));
    }

    #[test]
    fn test_function() {
        let expr = parse("count(//item)").unwrap();
        assert!(matches!(expr, Expr::Function(name, _) if name == "count"));
    }

    #[test]
    fn test_abbreviated_steps() {
        match parse("a/..").unwrap() {
            Expr::Path(_, step) => {
                assert_eq!(step.axis, Axis::Parent);
                assert_eq!(step.node_test, NodeTest::Node);
            }
            other => panic!("expected path, got {:?}", other),
        }
        assert!(matches!(parse(".").unwrap(), Expr::Step(step) if step.axis == Axis::Self_));
    }

    #[test]
    fn test_lone_root() {
        assert!(matches!(parse("/").unwrap(), Expr::Root));
        assert!(matches!(parse("/ | //a").unwrap(), Expr::Union(..)));
    }

    #[test]
    fn test_qualified_node_tests() {
        match parse("svg:rect").unwrap() {
            Expr::Step(step) => assert_eq!(step.node_test, NodeTest::QName("svg".into(), "rect".into())),
            other => panic!("expected step, got {:?}", other),
        }
        match parse("//svg:*").unwrap() {
            Expr::Path(_, step) => assert_eq!(step.node_test, NodeTest::NamespaceWildcard("svg".into())),
            other => panic!("expected path, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_expressions() {
        for bad in ["", "//", "//a[", "//a]", "a b", "$x", "'open", "//a[@id='x'", "1 +", "child::", "bogus::a", "@"] {
            assert!(parse(bad).is_err(), "{:?} should not parse", bad);
        }
    }
}
