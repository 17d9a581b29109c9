//! XPath Evaluation Engine
//!
//! Evaluates compiled XPath expressions against an XML document.

use super::axes::{matches_node_test, navigate};
use super::compiler::{CompiledExpr, CompiledNodeTest, Op, StepPredicate};
use super::functions;
use super::parser::{Axis, BinaryOp};
use super::value::{parse_number, XPathValue};
#[cfg(test)]
use crate::dom::XmlDocument;
use crate::dom::{DocumentAccess, NodeId};
use std::collections::HashSet;

/// Evaluation context - generic over document type
pub struct EvalContext<'a, D: DocumentAccess> {
    pub doc: &'a D,
    pub context_node: NodeId,
    pub context_position: usize,
    pub context_size: usize,
}

impl<'a, D: DocumentAccess> EvalContext<'a, D> {
    /// Context for a top-level evaluation at `node`
    pub fn new(doc: &'a D, context_node: NodeId) -> Self {
        EvalContext {
            doc,
            context_node,
            context_position: 1,
            context_size: 1,
        }
    }
}

/// Evaluate an XPath expression with the document node as context
#[must_use = "XPath evaluation result should be used"]
pub fn evaluate<D: DocumentAccess>(doc: &D, xpath: &str) -> Result<XPathValue, String> {
    evaluate_from_node(doc, doc.document_node_id(), xpath)
}

/// Evaluate an XPath expression from a specific context node
#[must_use = "XPath evaluation result should be used"]
pub fn evaluate_from_node<D: DocumentAccess>(doc: &D, context_node: NodeId, xpath: &str) -> Result<XPathValue, String> {
    let compiled = super::compiler::compile(xpath)?;
    evaluate_compiled(&compiled, &EvalContext::new(doc, context_node))
}

/// Evaluate a compiled expression
pub fn evaluate_compiled<D: DocumentAccess>(expr: &CompiledExpr, ctx: &EvalContext<'_, D>) -> Result<XPathValue, String> {
    let mut stack: Vec<XPathValue> = Vec::new();

    for op in &expr.ops {
        match op {
            Op::Root => {
                stack.push(XPathValue::single_node(ctx.doc.document_node_id()));
            }

            Op::Context => {
                stack.push(XPathValue::single_node(ctx.context_node));
            }

            Op::Navigate(axis, node_test, predicates) => {
                let current = stack.pop().unwrap_or(XPathValue::single_node(ctx.context_node));
                let Some(nodes) = current.into_nodeset() else {
                    stack.push(XPathValue::empty_nodeset());
                    continue;
                };

                if *axis == Axis::Attribute {
                    if !predicates.is_empty() {
                        return Err("Predicates on attribute steps are not supported".to_string());
                    }
                    stack.push(attribute_values(ctx.doc, &nodes, node_test));
                    continue;
                }

                // Positions are counted per context node, in axis order
                let mut seen = HashSet::with_capacity(nodes.len());
                let mut result = Vec::with_capacity(nodes.len());
                for node in nodes {
                    let candidates: Vec<NodeId> = navigate(ctx.doc, node, *axis)
                        .into_iter()
                        .filter(|&candidate| matches_node_test(ctx.doc, candidate, node_test))
                        .collect();
                    for selected in apply_step_predicates(ctx.doc, candidates, predicates)? {
                        if seen.insert(selected) {
                            result.push(selected);
                        }
                    }
                }
                // Node IDs are assigned in document order
                result.sort_unstable();
                stack.push(XPathValue::NodeSet(result));
            }

            Op::Predicate(pred_expr) => {
                let current = stack.pop().unwrap_or_default();
                match current.into_nodeset() {
                    Some(nodes) => stack.push(XPathValue::NodeSet(filter_nodes(ctx.doc, &nodes, pred_expr)?)),
                    None => return Err("Predicates apply to node-sets only".to_string()),
                }
            }

            Op::Union => {
                let right = stack.pop().unwrap_or_default();
                let left = stack.pop().unwrap_or_default();

                match (left, right) {
                    (XPathValue::NodeSet(l), XPathValue::NodeSet(r)) => {
                        let mut seen: HashSet<NodeId> = l.iter().copied().collect();
                        let mut result = l;
                        result.reserve(r.len());
                        for node in r {
                            if seen.insert(node) {
                                result.push(node);
                            }
                        }
                        result.sort_unstable();
                        stack.push(XPathValue::NodeSet(result));
                    }
                    (XPathValue::StringList(mut l), XPathValue::StringList(r)) => {
                        l.extend(r);
                        stack.push(XPathValue::StringList(l));
                    }
                    _ => {
                        return Err("Union requires two node-sets".to_string());
                    }
                }
            }

            Op::Number(n) => {
                stack.push(XPathValue::Number(*n));
            }

            Op::String(s) => {
                stack.push(XPathValue::String(s.clone()));
            }

            Op::Negate => {
                let val = stack.pop().unwrap_or(XPathValue::Number(0.0));
                stack.push(XPathValue::Number(-val.number_in(ctx.doc)));
            }

            Op::Binary(op) => {
                let right = stack.pop().unwrap_or(XPathValue::Number(0.0));
                let left = stack.pop().unwrap_or(XPathValue::Number(0.0));
                let num = |v: &XPathValue| v.number_in(ctx.doc);

                let result = match op {
                    BinaryOp::Or => XPathValue::Boolean(left.to_boolean() || right.to_boolean()),
                    BinaryOp::And => XPathValue::Boolean(left.to_boolean() && right.to_boolean()),
                    BinaryOp::Eq
                    | BinaryOp::NotEq
                    | BinaryOp::Lt
                    | BinaryOp::LtEq
                    | BinaryOp::Gt
                    | BinaryOp::GtEq => XPathValue::Boolean(compare_values(ctx.doc, *op, &left, &right)),
                    BinaryOp::Add => XPathValue::Number(num(&left) + num(&right)),
                    BinaryOp::Sub => XPathValue::Number(num(&left) - num(&right)),
                    BinaryOp::Mul => XPathValue::Number(num(&left) * num(&right)),
                    BinaryOp::Div => XPathValue::Number(num(&left) / num(&right)),
                    BinaryOp::Mod => XPathValue::Number(num(&left) % num(&right)),
                };

                stack.push(result);
            }

            Op::Call(name, arg_count) => {
                if stack.len() < *arg_count {
                    return Err(format!("Missing arguments for {}()", name));
                }
                let args = stack.split_off(stack.len() - *arg_count);

                let result = functions::call(
                    name,
                    args,
                    ctx.doc,
                    ctx.context_node,
                    ctx.context_position,
                    ctx.context_size,
                )?;

                stack.push(result);
            }
        }
    }

    Ok(stack.pop().unwrap_or_default())
}

/// Values of the attributes an attribute step selects, in document order
fn attribute_values<D: DocumentAccess>(doc: &D, nodes: &[NodeId], node_test: &CompiledNodeTest) -> XPathValue {
    let mut values: Vec<String> = Vec::new();
    for &node in nodes {
        match node_test {
            CompiledNodeTest::Any | CompiledNodeTest::Node => {
                values.extend(doc.get_attribute_values(node).into_iter().map(|(_, v)| v.to_string()));
            }
            CompiledNodeTest::Name(name) => {
                values.extend(doc.get_attribute(node, name).map(str::to_string));
            }
            CompiledNodeTest::QName(prefix, local) => {
                values.extend(doc.get_attribute(node, &format!("{}:{}", prefix, local)).map(str::to_string));
            }
            CompiledNodeTest::NamespaceWildcard(prefix) => {
                values.extend(
                    doc.get_attribute_values(node)
                        .into_iter()
                        .filter(|(name, _)| name.split_once(':').map_or(false, |(p, _)| p == prefix))
                        .map(|(_, v)| v.to_string()),
                );
            }
            _ => {}
        }
    }
    XPathValue::StringList(values)
}

/// Run a step's predicates over the candidates of one context node
fn apply_step_predicates<D: DocumentAccess>(
    doc: &D,
    mut nodes: Vec<NodeId>,
    predicates: &[StepPredicate],
) -> Result<Vec<NodeId>, String> {
    for predicate in predicates {
        if nodes.is_empty() {
            break;
        }
        nodes = match predicate {
            // Fast path: [n]
            StepPredicate::Position(pos) => nodes.get(pos - 1).copied().into_iter().collect(),
            // Fast path: [@attr = 'value']
            StepPredicate::AttrEq(name, value) => nodes
                .into_iter()
                .filter(|&node| doc.get_attribute(node, name) == Some(value.as_str()))
                .collect(),
            StepPredicate::Expr(expr) => filter_nodes(doc, &nodes, expr)?,
        };
    }
    Ok(nodes)
}

/// Keep the nodes for which the predicate holds. A numeric result is
/// compared against the proximity position.
fn filter_nodes<D: DocumentAccess>(doc: &D, nodes: &[NodeId], pred_expr: &CompiledExpr) -> Result<Vec<NodeId>, String> {
    let size = nodes.len();
    let mut filtered = Vec::new();

    for (i, &node) in nodes.iter().enumerate() {
        let pred_ctx = EvalContext {
            doc,
            context_node: node,
            context_position: i + 1,
            context_size: size,
        };

        let include = match evaluate_compiled(pred_expr, &pred_ctx)? {
            XPathValue::Number(n) => (i + 1) as f64 == n,
            other => other.to_boolean(),
        };

        if include {
            filtered.push(node);
        }
    }

    Ok(filtered)
}

/// A scalar operand of a comparison
enum Atom<'s> {
    Str(&'s str),
    Num(f64),
    Bool(bool),
}

impl Atom<'_> {
    fn number(&self) -> f64 {
        match self {
            Atom::Str(s) => parse_number(s),
            Atom::Num(n) => *n,
            Atom::Bool(b) => f64::from(u8::from(*b)),
        }
    }

    fn boolean(&self) -> bool {
        match self {
            Atom::Str(s) => !s.is_empty(),
            Atom::Num(n) => *n != 0.0 && !n.is_nan(),
            Atom::Bool(b) => *b,
        }
    }
}

/// Compare two atoms with XPath 1.0 conversion rules: equality prefers
/// booleans, then numbers, then strings; ordering is always numeric
fn atoms_hold(op: BinaryOp, left: &Atom<'_>, right: &Atom<'_>) -> bool {
    match op {
        BinaryOp::Eq | BinaryOp::NotEq => {
            let equal = match (left, right) {
                (Atom::Bool(_), _) | (_, Atom::Bool(_)) => left.boolean() == right.boolean(),
                (Atom::Num(_), _) | (_, Atom::Num(_)) => left.number() == right.number(),
                (Atom::Str(l), Atom::Str(r)) => l == r,
            };
            // NaN compares unequal to everything, itself included
            if op == BinaryOp::Eq {
                equal
            } else {
                !equal
            }
        }
        BinaryOp::Lt => left.number() < right.number(),
        BinaryOp::LtEq => left.number() <= right.number(),
        BinaryOp::Gt => left.number() > right.number(),
        BinaryOp::GtEq => left.number() >= right.number(),
        _ => false,
    }
}

fn scalar_atom(value: &XPathValue) -> Atom<'_> {
    match value {
        XPathValue::Boolean(b) => Atom::Bool(*b),
        XPathValue::Number(n) => Atom::Num(*n),
        XPathValue::String(s) => Atom::Str(s),
        // Sets are handled by the caller
        XPathValue::NodeSet(_) | XPathValue::StringList(_) => Atom::Str(""),
    }
}

/// Comparison with node-set semantics: a set compares true when some
/// member's string-value does; against a boolean the set converts first
fn compare_values<D: DocumentAccess>(doc: &D, op: BinaryOp, left: &XPathValue, right: &XPathValue) -> bool {
    match (left.member_strings(doc), right.member_strings(doc)) {
        (Some(l), Some(r)) => l
            .iter()
            .any(|a| r.iter().any(|b| atoms_hold(op, &Atom::Str(a), &Atom::Str(b)))),
        (Some(members), None) => match right {
            XPathValue::Boolean(b) => atoms_hold(op, &Atom::Bool(!members.is_empty()), &Atom::Bool(*b)),
            _ => {
                let scalar = scalar_atom(right);
                members.iter().any(|m| atoms_hold(op, &Atom::Str(m), &scalar))
            }
        },
        (None, Some(members)) => match left {
            XPathValue::Boolean(b) => atoms_hold(op, &Atom::Bool(*b), &Atom::Bool(!members.is_empty())),
            _ => {
                let scalar = scalar_atom(left);
                members.iter().any(|m| atoms_hold(op, &scalar, &Atom::Str(m)))
            }
        },
        (None, None) => atoms_hold(op, &scalar_atom(left), &scalar_atom(right)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(doc: &XmlDocument, value: &XPathValue) -> Vec<String> {
        value
            .as_nodeset()
            .expect("node-set")
            .iter()
            .map(|&id| doc.node_name(id).unwrap_or("#").to_string())
            .collect()
    }

    fn texts(doc: &XmlDocument, xpath: &str) -> Vec<String> {
        let value = evaluate(doc, xpath).unwrap();
        value
            .as_nodeset()
            .expect("node-set")
            .iter()
            .map(|&id| crate::dom::node_string_value(doc, id))
            .collect()
    }

    fn truth(doc: &XmlDocument, xpath: &str) -> bool {
        evaluate(doc, xpath).unwrap().to_boolean()
    }

    #[test]
    fn test_simple_path() {
        let doc = XmlDocument::parse("<root><child/></root>").unwrap();
        let result = evaluate(&doc, "/root/child").unwrap();
        assert_eq!(names(&doc, &result), vec!["child"]);
    }

    #[test]
    fn test_descendant() {
        let doc = XmlDocument::parse("<root><a><b/></a></root>").unwrap();
        let result = evaluate(&doc, "//b").unwrap();
        assert_eq!(result.as_nodeset().unwrap().len(), 1);
    }

    #[test]
    fn test_context_is_document_node() {
        let doc = XmlDocument::parse("<root><x/></root>").unwrap();
        assert_eq!(names(&doc, &evaluate(&doc, "descendant-or-self::x").unwrap()), vec!["x"]);
        assert_eq!(names(&doc, &evaluate(&doc, "root").unwrap()), vec!["root"]);
        assert_eq!(evaluate(&doc, "/").unwrap().as_nodeset().unwrap(), &vec![doc.document_node_id()]);
    }

    #[test]
    fn test_positions_are_per_parent() {
        let doc = XmlDocument::parse("<r><ul><li>a</li><li>b</li></ul><ul><li>c</li></ul></r>").unwrap();
        assert_eq!(texts(&doc, "//li[1]"), vec!["a", "c"]);
        assert_eq!(texts(&doc, "(//li)[1]"), vec!["a"]);
        assert_eq!(texts(&doc, "//li[last()]"), vec!["b", "c"]);
        assert_eq!(texts(&doc, "//li[position() = 2]"), vec!["b"]);
    }

    #[test]
    fn test_reverse_axis_positions() {
        let doc = XmlDocument::parse("<r><a/><b/><c/></r>").unwrap();
        let result = evaluate(&doc, "//c/preceding-sibling::*[1]").unwrap();
        assert_eq!(names(&doc, &result), vec!["b"]);
        let result = evaluate(&doc, "//c/ancestor-or-self::*[2]").unwrap();
        assert_eq!(names(&doc, &result), vec!["r"]);
    }

    #[test]
    fn test_chained_predicates() {
        let doc = XmlDocument::parse(r#"<r><i k="x"/><i k="y"/><i k="x"/></r>"#).unwrap();
        let result = evaluate(&doc, "//i[@k='x'][2]").unwrap();
        assert_eq!(result.as_nodeset().unwrap().len(), 1);
        let third = doc.elements_by_tag_name("i")[2];
        assert_eq!(result.as_nodeset().unwrap()[0], third);
    }

    #[test]
    fn test_attributes_are_strings() {
        let doc = XmlDocument::parse(r#"<r><item id="1"/><item id="2"/><item/></r>"#).unwrap();
        match evaluate(&doc, "//item/@id").unwrap() {
            XPathValue::StringList(values) => assert_eq!(values, vec!["1", "2"]),
            other => panic!("expected string list, got {:?}", other),
        }
        assert_eq!(evaluate(&doc, "count(//item/@id)").unwrap().to_number(), 2.0);
        assert_eq!(evaluate(&doc, "count(//item[@id])").unwrap().to_number(), 2.0);
        assert_eq!(evaluate(&doc, "count(//item[not(@id)])").unwrap().to_number(), 1.0);
    }

    #[test]
    fn test_empty_attribute_value_still_exists() {
        let doc = XmlDocument::parse(r#"<r><a x=""/></r>"#).unwrap();
        assert!(truth(&doc, "//a[@x]"));
        assert!(truth(&doc, "//a[@x = '']"));
    }

    #[test]
    fn test_node_set_comparisons() {
        let doc = XmlDocument::parse("<r><p>10</p><p>20</p><name>bob</name></r>").unwrap();
        assert!(truth(&doc, "//p = 20"));
        assert!(truth(&doc, "//p != 20"));
        assert!(truth(&doc, "//p > 15"));
        assert!(!truth(&doc, "//p > 25"));
        assert!(truth(&doc, "15 < //p"));
        assert!(truth(&doc, "//name = 'bob'"));
        assert!(truth(&doc, "//p = //p"));
        assert!(!truth(&doc, "//missing = //p"));
        assert!(truth(&doc, "//missing = false()"));
        assert!(truth(&doc, "sum(//p) = 30"));
        assert!(truth(&doc, "//p[1] * 2 = 20"));
    }

    #[test]
    fn test_scalar_comparisons() {
        let doc = XmlDocument::parse("<r/>").unwrap();
        assert!(truth(&doc, "1 = 1.0"));
        assert!(truth(&doc, "'1' = 1"));
        assert!(truth(&doc, "true() = 'x'"));
        assert!(truth(&doc, "'abc' != 'abd'"));
        assert!(truth(&doc, "number('x') != number('x')"));
        assert!(!truth(&doc, "number('x') = number('x')"));
        assert!(truth(&doc, "2 >= '2'"));
    }

    #[test]
    fn test_arithmetic() {
        let doc = XmlDocument::parse("<r/>").unwrap();
        assert_eq!(evaluate(&doc, "7 mod 3").unwrap().to_number(), 1.0);
        assert_eq!(evaluate(&doc, "7 div 2").unwrap().to_number(), 3.5);
        assert_eq!(evaluate(&doc, "-(2 + 3) * 2").unwrap().to_number(), -10.0);
    }

    #[test]
    fn test_abbreviated_steps() {
        let doc = XmlDocument::parse("<r><a><b/></a></r>").unwrap();
        assert_eq!(names(&doc, &evaluate(&doc, "//b/..").unwrap()), vec!["a"]);
        assert_eq!(names(&doc, &evaluate(&doc, "//b/../..").unwrap()), vec!["r"]);
        assert_eq!(names(&doc, &evaluate(&doc, "//a/.").unwrap()), vec!["a"]);
        assert_eq!(names(&doc, &evaluate(&doc, "//a[./b]").unwrap()), vec!["a"]);
    }

    #[test]
    fn test_union_in_document_order() {
        let doc = XmlDocument::parse("<r><a/><b/><c/></r>").unwrap();
        assert_eq!(names(&doc, &evaluate(&doc, "//c | //a").unwrap()), vec!["a", "c"]);
        assert!(evaluate(&doc, "//a | 1").is_err());
    }

    #[test]
    fn test_text_and_other_node_tests() {
        let doc = XmlDocument::parse("<r>x<!--c--><?pi d?><a>y</a></r>").unwrap();
        assert_eq!(evaluate(&doc, "count(/r/text())").unwrap().to_number(), 1.0);
        assert_eq!(evaluate(&doc, "count(//comment())").unwrap().to_number(), 1.0);
        assert_eq!(evaluate(&doc, "count(//processing-instruction('pi'))").unwrap().to_number(), 1.0);
        assert_eq!(evaluate(&doc, "count(/r/node())").unwrap().to_number(), 4.0);
        assert_eq!(evaluate(&doc, "string(/r)").unwrap().to_string_value(), "xy");
    }

    #[test]
    fn test_css_shaped_expressions() {
        let doc = XmlDocument::parse(r#"<r><p class="lead  big">x</p><p class="leader">y</p></r>"#).unwrap();
        let xpath = "descendant-or-self::p[@class and contains(concat(' ', normalize-space(@class), ' '), ' lead ')]";
        assert_eq!(texts(&doc, xpath), vec!["x"]);
        let ends = "descendant-or-self::p[@class and substring(@class, string-length(@class) - 2) = 'der']";
        assert_eq!(texts(&doc, ends), vec!["y"]);
    }

    #[test]
    fn test_errors() {
        let doc = XmlDocument::parse("<r/>").unwrap();
        assert!(evaluate(&doc, "//r/@id[1]").is_err());
        assert!(evaluate(&doc, "count(1)").is_err());
        assert!(evaluate(&doc, "id('x')").is_err());
        assert!(evaluate(&doc, "'s'[1]").is_err());
    }
}
