//! Contains pure functions for collecting nodes along each XPath axis.
//!
//! Every collector appends nodes in proximity order: document order for
//! forward axes and reverse document order for reverse axes. Predicates rely
//! on this when they compute `position()`.

use crate::ast::Axis;
use crate::datasource::{DataSourceNode, NodeType};

/// Appends the nodes reachable from `node` along `axis`.
pub fn collect<'a, N: DataSourceNode<'a>>(axis: Axis, node: N, results: &mut Vec<N>) {
    match axis {
        Axis::Child => collect_child_nodes(node, results),
        Axis::Descendant => collect_descendant_nodes(node, results),
        Axis::DescendantOrSelf => collect_descendant_or_self_nodes(node, results),
        Axis::Attribute => collect_attribute_nodes(node, results),
        Axis::Namespace => collect_namespace_nodes(node, results),
        Axis::Parent => collect_parent_nodes(node, results),
        Axis::Ancestor => collect_ancestor_nodes(node, results),
        Axis::AncestorOrSelf => {
            results.push(node);
            collect_ancestor_nodes(node, results);
        }
        Axis::SelfAxis => results.push(node),
        Axis::FollowingSibling => collect_following_sibling_nodes(node, results),
        Axis::PrecedingSibling => collect_preceding_sibling_nodes(node, results),
        Axis::Following => collect_following_nodes(node, results),
        Axis::Preceding => collect_preceding_nodes(node, results),
    }
}

fn is_tree_child<'a, N: DataSourceNode<'a>>(node: N) -> bool {
    !matches!(node.node_type(), NodeType::Attribute | NodeType::Namespace)
}

pub fn collect_child_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    results.extend(node.children());
}

pub fn collect_attribute_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    if node.node_type() == NodeType::Element {
        results.extend(node.attributes());
    }
}

pub fn collect_namespace_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    if node.node_type() == NodeType::Element {
        results.extend(node.namespaces());
    }
}

pub fn collect_descendant_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    // Pre-order walk; children are pushed reversed so they pop in document order.
    let mut stack: Vec<N> = node.children().collect();
    stack.reverse();
    while let Some(current) = stack.pop() {
        results.push(current);
        let start = stack.len();
        stack.extend(current.children());
        stack[start..].reverse();
    }
}

pub fn collect_descendant_or_self_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    results: &mut Vec<N>,
) {
    results.push(node);
    collect_descendant_nodes(node, results);
}

pub fn collect_parent_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    results.extend(node.parent());
}

pub fn collect_ancestor_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut current = node.parent();
    while let Some(p) = current {
        results.push(p);
        current = p.parent();
    }
}

pub fn collect_following_sibling_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    results: &mut Vec<N>,
) {
    if !is_tree_child(node) {
        return;
    }
    if let Some(parent) = node.parent() {
        results.extend(parent.children().skip_while(|s| *s != node).skip(1));
    }
}

pub fn collect_preceding_sibling_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    results: &mut Vec<N>,
) {
    if !is_tree_child(node) {
        return;
    }
    if let Some(parent) = node.parent() {
        let start = results.len();
        results.extend(parent.children().take_while(|s| *s != node));
        results[start..].reverse();
    }
}

pub fn collect_following_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut current = node;
    if !is_tree_child(node) {
        // The owner element's content follows its attributes in document order.
        let Some(owner) = node.parent() else { return };
        for child in owner.children() {
            collect_descendant_or_self_nodes(child, results);
        }
        current = owner;
    }
    while let Some(parent) = current.parent() {
        for sibling in parent.children().skip_while(|s| *s != current).skip(1) {
            collect_descendant_or_self_nodes(sibling, results);
        }
        current = parent;
    }
}

pub fn collect_preceding_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut current = node;
    if !is_tree_child(node) {
        match node.parent() {
            Some(owner) => current = owner,
            None => return,
        }
    }
    // Gather each ancestor level in document order, nearest level first, then
    // flip the whole run into reverse document order.
    let start = results.len();
    let mut levels: Vec<Vec<N>> = Vec::new();
    while let Some(parent) = current.parent() {
        let mut level = Vec::new();
        for sibling in parent.children().take_while(|s| *s != current) {
            collect_descendant_or_self_nodes(sibling, &mut level);
        }
        levels.push(level);
        current = parent;
    }
    for level in levels.into_iter().rev() {
        results.extend(level);
    }
    results[start..].reverse();
}
