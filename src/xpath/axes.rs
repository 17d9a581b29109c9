//! XPath Axes Implementation
//!
//! All 13 XPath 1.0 axes:
//! - child, parent, self
//! - descendant, descendant-or-self
//! - ancestor, ancestor-or-self
//! - following, following-sibling
//! - preceding, preceding-sibling
//! - attribute, namespace

use super::compiler::CompiledNodeTest;
use super::parser::Axis;
#[cfg(test)]
use crate::dom::XmlDocument;
use crate::dom::{DocumentAccess, NodeId, NodeKind};
use std::collections::HashSet;

/// Navigate along an axis from a context node
pub fn navigate<D: DocumentAccess>(doc: &D, context: NodeId, axis: Axis) -> Vec<NodeId> {
    match axis {
        Axis::Child => child_axis(doc, context),
        Axis::Descendant => descendant_axis(doc, context),
        Axis::DescendantOrSelf => descendant_or_self_axis(doc, context),
        Axis::Parent => parent_axis(doc, context),
        Axis::Ancestor => ancestor_axis(doc, context),
        Axis::AncestorOrSelf => ancestor_or_self_axis(doc, context),
        Axis::FollowingSibling => following_sibling_axis(doc, context),
        Axis::PrecedingSibling => preceding_sibling_axis(doc, context),
        Axis::Following => following_axis(doc, context),
        Axis::Preceding => preceding_axis(doc, context),
        Axis::Self_ => self_axis(context),
        Axis::Attribute => attribute_axis(context),
        Axis::Namespace => namespace_axis(context),
    }
}

/// child:: axis - all child nodes
fn child_axis<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    doc.children_vec(context)
}

/// descendant:: axis - all descendants (children, grandchildren, etc.)
fn descendant_axis<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    doc.descendants_vec(context)
}

/// descendant-or-self:: axis - context node plus all descendants
fn descendant_or_self_axis<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let descendants = doc.descendants_vec(context);
    let mut result = Vec::with_capacity(1 + descendants.len());
    result.push(context);
    result.extend(descendants);
    result
}

/// parent:: axis - parent node (at most one)
fn parent_axis<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    if let Some(parent) = doc.parent_of(context) {
        vec![parent]
    } else {
        Vec::new()
    }
}

/// ancestor:: axis - all ancestors (parent, grandparent, etc.)
fn ancestor_axis<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut current = context;

    while let Some(parent) = doc.parent_of(current) {
        result.push(parent);
        current = parent;
    }

    result
}

/// ancestor-or-self:: axis - context node plus all ancestors
fn ancestor_or_self_axis<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut result = vec![context];
    result.extend(ancestor_axis(doc, context));
    result
}

/// following-sibling:: axis - all following siblings
fn following_sibling_axis<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();

    let mut sibling = doc.next_sibling_of(context);
    while let Some(sib_id) = sibling {
        result.push(sib_id);
        sibling = doc.next_sibling_of(sib_id);
    }

    result
}

/// preceding-sibling:: axis - all preceding siblings (reverse order)
fn preceding_sibling_axis<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();

    let mut sibling = doc.prev_sibling_of(context);
    while let Some(sib_id) = sibling {
        result.push(sib_id);
        sibling = doc.prev_sibling_of(sib_id);
    }

    result
}

/// following:: axis - all nodes after in document order (not ancestors)
fn following_axis<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();

    // Get all following siblings and their descendants
    let mut sibling = doc.next_sibling_of(context);
    while let Some(sib_id) = sibling {
        result.push(sib_id);
        result.extend(doc.descendants_vec(sib_id));
        sibling = doc.next_sibling_of(sib_id);
    }

    // Then do the same for ancestors' following siblings
    let mut ancestor = doc.parent_of(context);
    while let Some(anc_id) = ancestor {
        let mut sibling = doc.next_sibling_of(anc_id);
        while let Some(sib_id) = sibling {
            result.push(sib_id);
            result.extend(doc.descendants_vec(sib_id));
            sibling = doc.next_sibling_of(sib_id);
        }
        ancestor = doc.parent_of(anc_id);
    }

    result
}

/// preceding:: axis - all nodes before in document order (not ancestors),
/// nearest first
fn preceding_axis<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let ancestors: HashSet<NodeId> = ancestor_axis(doc, context).into_iter().collect();

    let mut result: Vec<NodeId> = doc
        .descendants_vec(doc.document_node_id())
        .into_iter()
        .take_while(|&id| id != context)
        .filter(|id| !ancestors.contains(id))
        .collect();
    result.reverse();
    result
}

/// self:: axis - just the context node
fn self_axis(context: NodeId) -> Vec<NodeId> {
    vec![context]
}

/// attribute:: axis - attributes are not nodes here; the evaluator
/// resolves them to their string values instead
fn attribute_axis(_context: NodeId) -> Vec<NodeId> {
    Vec::new()
}

/// namespace:: axis - namespace nodes are not modelled
fn namespace_axis(_context: NodeId) -> Vec<NodeId> {
    Vec::new()
}

/// Check if a node matches a node test. Names compare as written,
/// prefix included.
pub fn matches_node_test<D: DocumentAccess>(doc: &D, node_id: NodeId, node_test: &CompiledNodeTest) -> bool {
    let Some(kind) = doc.node_kind_of(node_id) else {
        return false;
    };

    match node_test {
        CompiledNodeTest::Any => kind == NodeKind::Element,
        CompiledNodeTest::Name(name) => kind == NodeKind::Element && doc.node_name(node_id) == Some(name.as_str()),
        CompiledNodeTest::QName(prefix, local) => {
            kind == NodeKind::Element
                && doc
                    .node_name(node_id)
                    .and_then(|n| n.split_once(':'))
                    .map_or(false, |(p, l)| p == prefix && l == local)
        }
        CompiledNodeTest::NamespaceWildcard(prefix) => {
            kind == NodeKind::Element
                && doc
                    .node_name(node_id)
                    .and_then(|n| n.split_once(':'))
                    .map_or(false, |(p, _)| p == prefix)
        }
        CompiledNodeTest::Node => true,
        CompiledNodeTest::Text => kind == NodeKind::Text || kind == NodeKind::CData,
        CompiledNodeTest::Comment => kind == NodeKind::Comment,
        CompiledNodeTest::ProcessingInstruction(target) => {
            if kind != NodeKind::ProcessingInstruction {
                return false;
            }
            match target {
                Some(expected) => doc.node_name(node_id) == Some(expected.as_str()),
                None => true,
            }
        }
    }
}
