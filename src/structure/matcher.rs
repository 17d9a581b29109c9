//! Recursive structural containment
//!
//! A schema node is contained in a target node when every element child of
//! the schema node is contained in some same-named element child of the
//! target node. Text, attributes and sibling order are not compared.

use log::trace;

use crate::dom::{DocumentAccess, NodeId, NodeKind};

/// Does `target_node` contain the structure below `schema_node`?
///
/// Each schema child takes the first target child, in document order, with
/// the same tag name that recursively matches; a same-named child that fails
/// does not stop later siblings from being tried.
pub fn matches<S, T>(schema: &S, schema_node: NodeId, target: &T, target_node: NodeId) -> bool
where
    S: DocumentAccess,
    T: DocumentAccess,
{
    element_children(schema, schema_node).all(|schema_child| {
        let name = schema.node_name(schema_child);
        let found = element_children(target, target_node)
            .filter(|&candidate| target.node_name(candidate) == name)
            .find(|&candidate| {
                let matched = matches(schema, schema_child, target, candidate);
                trace!(
                    target: "xmlstructure::structure",
                    "<{}> schema node {} vs target node {}: {}",
                    name.unwrap_or(""),
                    schema_child,
                    candidate,
                    matched
                );
                matched
            });
        found.is_some()
    })
}

/// Element children in document order
pub fn element_children<D: DocumentAccess>(doc: &D, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    std::iter::successors(doc.first_child_of(id), move |&child| doc.next_sibling_of(child))
        .filter(move |&child| doc.node_kind_of(child) == Some(NodeKind::Element))
}
