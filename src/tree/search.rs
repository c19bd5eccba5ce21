//! Search over the navigation tree.

use std::sync::Arc;

use super::NavNode;

/// Prune `nav` to the nodes whose title contains `term` (case-insensitive), keeping
/// every ancestor of a match.
///
/// Retained nodes carry only their filtered children. A blank term returns `nav`
/// itself so the caller gets its unfiltered snapshot back.
pub fn filter(nav: &Arc<Vec<NavNode>>, term: &str) -> Arc<Vec<NavNode>> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return Arc::clone(nav);
    }
    Arc::new(filter_nodes(nav, &term))
}

fn filter_nodes(nodes: &[NavNode], term: &str) -> Vec<NavNode> {
    nodes
        .iter()
        .filter_map(|node| {
            let children = filter_nodes(&node.children, term);
            let matches = node.record.title.to_lowercase().contains(term);
            (matches || !children.is_empty()).then(|| NavNode {
                record: node.record.clone(),
                has_children: node.has_children,
                is_expanded: node.is_expanded,
                children,
            })
        })
        .collect()
}
