//! XPath Expression Compiler
//!
//! Compiles parsed XPath expressions into a flat stack program. Location
//! steps carry their own predicates so positions are counted per context
//! node; the common `[n]` and `[@attr='v']` forms get dedicated ops.

use super::functions;
use super::parser::{Axis, BinaryOp, Expr, NodeTest, Step};

/// Compiled XPath expression
#[derive(Debug, Clone)]
pub struct CompiledExpr {
    pub ops: Vec<Op>,
}

/// Compiled operation
#[derive(Debug, Clone)]
pub enum Op {
    /// Push the document node onto the stack
    Root,
    /// Push context node onto stack
    Context,
    /// Navigate along axis with node test, filtering each context node's
    /// candidates through the step predicates
    Navigate(Axis, CompiledNodeTest, Vec<StepPredicate>),
    /// Filter the node-set on the stack, positions in document order
    Predicate(Box<CompiledExpr>),
    /// Union two node sets
    Union,
    /// Push literal number
    Number(f64),
    /// Push literal string
    String(String),
    /// Call function
    Call(String, usize), // name, arg count
    /// Binary operation
    Binary(BinaryOp),
    /// Negate
    Negate,
}

/// Predicate attached to a location step
#[derive(Debug, Clone)]
pub enum StepPredicate {
    /// `[n]`
    Position(usize),
    /// `[@name = 'value']`
    AttrEq(String, String),
    /// Anything else
    Expr(CompiledExpr),
}

/// Compiled node test
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledNodeTest {
    Any,
    Name(String),
    /// prefix and local part, matched against the full `prefix:local` name
    QName(String, String),
    NamespaceWildcard(String),
    Node,
    Text,
    Comment,
    ProcessingInstruction(Option<String>),
}

impl From<&NodeTest> for CompiledNodeTest {
    fn from(test: &NodeTest) -> Self {
        match test {
            NodeTest::Any => CompiledNodeTest::Any,
            NodeTest::Name(n) => CompiledNodeTest::Name(n.clone()),
            NodeTest::QName(ns, local) => CompiledNodeTest::QName(ns.clone(), local.clone()),
            NodeTest::NamespaceWildcard(ns) => CompiledNodeTest::NamespaceWildcard(ns.clone()),
            NodeTest::Node => CompiledNodeTest::Node,
            NodeTest::Text => CompiledNodeTest::Text,
            NodeTest::Comment => CompiledNodeTest::Comment,
            NodeTest::ProcessingInstruction(arg) => CompiledNodeTest::ProcessingInstruction(arg.clone()),
        }
    }
}

impl CompiledExpr {
    /// Compile a parsed expression; unknown functions are rejected here
    pub fn compile(expr: &Expr) -> Result<Self, String> {
        let mut ops = Vec::new();
        Self::compile_expr(expr, &mut ops)?;
        Ok(CompiledExpr { ops })
    }

    fn compile_expr(expr: &Expr, ops: &mut Vec<Op>) -> Result<(), String> {
        match expr {
            Expr::Root => {
                ops.push(Op::Root);
            }
            Expr::Number(n) => {
                ops.push(Op::Number(*n));
            }
            Expr::String(s) => {
                ops.push(Op::String(s.clone()));
            }
            Expr::Negate(inner) => {
                Self::compile_expr(inner, ops)?;
                ops.push(Op::Negate);
            }
            Expr::Binary(left, op, right) => {
                Self::compile_expr(left, ops)?;
                Self::compile_expr(right, ops)?;
                ops.push(Op::Binary(*op));
            }
            Expr::Union(left, right) => {
                Self::compile_expr(left, ops)?;
                Self::compile_expr(right, ops)?;
                ops.push(Op::Union);
            }
            Expr::Path(base, step) => {
                Self::compile_expr(base, ops)?;
                ops.push(Self::compile_step(step)?);
            }
            Expr::Filter(base, pred) => {
                Self::compile_expr(base, ops)?;
                ops.push(Op::Predicate(Box::new(CompiledExpr::compile(pred)?)));
            }
            Expr::Step(step) => {
                ops.push(Op::Context);
                ops.push(Self::compile_step(step)?);
            }
            Expr::Function(name, args) => {
                if !functions::is_known(name) {
                    return Err(format!("Unknown function: {}", name));
                }
                for arg in args {
                    Self::compile_expr(arg, ops)?;
                }
                ops.push(Op::Call(name.clone(), args.len()));
            }
        }
        Ok(())
    }

    fn compile_step(step: &Step) -> Result<Op, String> {
        let predicates = step
            .predicates
            .iter()
            .map(Self::compile_step_predicate)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Op::Navigate(step.axis, CompiledNodeTest::from(&step.node_test), predicates))
    }

    fn compile_step_predicate(pred: &Expr) -> Result<StepPredicate, String> {
        if let Expr::Number(n) = pred {
            if *n >= 1.0 && n.fract() == 0.0 && *n <= usize::MAX as f64 {
                return Ok(StepPredicate::Position(*n as usize));
            }
        }

        if let Expr::Binary(left, BinaryOp::Eq, right) = pred {
            let pair = match (left.as_ref(), right.as_ref()) {
                (Expr::Step(step), Expr::String(value)) | (Expr::String(value), Expr::Step(step)) => {
                    Some((step, value))
                }
                _ => None,
            };
            if let Some((step, value)) = pair {
                if let (Axis::Attribute, NodeTest::Name(name), true) =
                    (step.axis, &step.node_test, step.predicates.is_empty())
                {
                    return Ok(StepPredicate::AttrEq(name.clone(), value.clone()));
                }
            }
        }

        Ok(StepPredicate::Expr(CompiledExpr::compile(pred)?))
    }
}

/// Compile an XPath expression string
pub fn compile(xpath: &str) -> Result<CompiledExpr, String> {
    let expr = super::parser::parse(xpath)?;
    CompiledExpr::compile(&expr)
}
