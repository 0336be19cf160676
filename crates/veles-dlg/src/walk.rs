//! Canonical graph traversal.
//!
//! One traversal order backs everything that cares about order: edge
//! classification, reachability, and the serializer's table layout. The
//! order is: entry-point edges in list order, then depth-first through each
//! node's outgoing edges in stored order. The first edge to reach a node is
//! its original introduction; every later edge is a link. Because the
//! serializer walks the same order, classification never disagrees with the
//! emitted file.

use crate::graph::{Dialog, EdgeKind, FxHashMap, FxHashSet, NodeId};

/// Result of one canonical traversal.
pub(crate) struct Walk {
    /// Nodes in discovery order, reachable ones first.
    pub order: Vec<NodeId>,
    /// How many of `order` are reachable from the entry points.
    pub reachable: usize,
    /// Classification of each entry-point edge, by position.
    pub start_kinds: Vec<EdgeKind>,
    /// Classification of each node's outgoing edges, by position.
    pub edge_kinds: FxHashMap<NodeId, Vec<EdgeKind>>,
}

/// Walk the graph in canonical order.
///
/// With `include_unreachable`, nodes no entry point reaches are appended in
/// creation order and walked too, so every node ends up classified and
/// serializable; without it, the walk stops at the reachable set.
pub(crate) fn walk(dialog: &Dialog, include_unreachable: bool) -> Walk {
    let mut seen = FxHashSet::default();
    let mut order = Vec::with_capacity(dialog.len());
    let mut edge_kinds: FxHashMap<NodeId, Vec<EdgeKind>> = FxHashMap::default();
    let mut start_kinds = Vec::with_capacity(dialog.starts.len());

    for edge in &dialog.starts {
        let target = edge.target;
        if dialog.contains(target) && seen.insert(target) {
            start_kinds.push(EdgeKind::Original);
            enter(dialog, target, &mut order, &mut edge_kinds);
            descend(dialog, target, &mut seen, &mut order, &mut edge_kinds);
        } else {
            start_kinds.push(EdgeKind::Link);
        }
    }

    let reachable = order.len();

    if include_unreachable {
        for &id in dialog.node_ids() {
            if seen.insert(id) {
                enter(dialog, id, &mut order, &mut edge_kinds);
                descend(dialog, id, &mut seen, &mut order, &mut edge_kinds);
            }
        }
    }

    Walk { order, reachable, start_kinds, edge_kinds }
}

/// Record a node's discovery.
fn enter(
    dialog: &Dialog,
    id: NodeId,
    order: &mut Vec<NodeId>,
    edge_kinds: &mut FxHashMap<NodeId, Vec<EdgeKind>>,
) {
    order.push(id);
    if let Some(node) = dialog.node(id) {
        edge_kinds.insert(id, vec![EdgeKind::Link; node.edges.len()]);
    }
}

/// Depth-first walk below an already-entered node.
///
/// An explicit frame stack stands in for recursion: the visited check
/// happens before a target is entered, so cycles terminate, and a dangling
/// target (absent from the arena) is simply left classified as a link.
fn descend(
    dialog: &Dialog,
    root: NodeId,
    seen: &mut FxHashSet<NodeId>,
    order: &mut Vec<NodeId>,
    edge_kinds: &mut FxHashMap<NodeId, Vec<EdgeKind>>,
) {
    let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];

    while let Some((id, at)) = stack.pop() {
        let Some(node) = dialog.node(id) else { continue };
        if at >= node.edges.len() {
            continue;
        }
        stack.push((id, at + 1));

        let target = node.edges[at].target;
        if dialog.contains(target) && seen.insert(target) {
            if let Some(kinds) = edge_kinds.get_mut(&id) {
                kinds[at] = EdgeKind::Original;
            }
            enter(dialog, target, order, edge_kinds);
            stack.push((target, 0));
        }
    }
}

impl Dialog {
    /// Recompute every edge's original/link classification.
    ///
    /// Mutation methods call this automatically; call it manually after
    /// editing `edges` through [`Dialog::node_mut`].
    pub fn reclassify(&mut self) {
        let walk = walk(self, true);
        for (edge, kind) in self.starts.iter_mut().zip(&walk.start_kinds) {
            edge.kind = *kind;
        }
        for (id, kinds) in walk.edge_kinds {
            if let Some(node) = self.node_mut(id) {
                for (edge, kind) in node.edges.iter_mut().zip(&kinds) {
                    edge.kind = *kind;
                }
            }
        }
    }

    /// The set of nodes reachable from the entry points.
    pub fn reachable(&self) -> Vec<NodeId> {
        walk(self, false).order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, NodeKind};
    use veles_gff::LocString;

    fn line(text: &str) -> LocString {
        LocString::inline(0, text)
    }

    #[test]
    fn test_shared_target_gets_one_original() {
        let mut d = Dialog::new();
        let a = d.add_node(NodeKind::Speaker, line("a"));
        let b = d.add_node(NodeKind::Speaker, line("b"));
        let r = d.add_node(NodeKind::Reply, line("shared"));
        d.add_start(Edge::to(a)).unwrap();
        d.add_start(Edge::to(b)).unwrap();
        d.add_edge(a, Edge::to(r)).unwrap();
        d.add_edge(b, Edge::to(r)).unwrap();

        assert_eq!(d.node(a).unwrap().edges[0].kind, EdgeKind::Original);
        assert_eq!(d.node(b).unwrap().edges[0].kind, EdgeKind::Link);
        assert_eq!(d.len(), 3);
    }

    #[test]
    fn test_cycle_terminates_and_classifies_back_edge_as_link() {
        let mut d = Dialog::new();
        let a = d.add_node(NodeKind::Speaker, line("again?"));
        let r = d.add_node(NodeKind::Reply, line("again."));
        d.add_start(Edge::to(a)).unwrap();
        d.add_edge(a, Edge::to(r)).unwrap();
        d.add_edge(r, Edge::to(a)).unwrap(); // loop back

        let w = walk(&d, false);
        assert_eq!(w.order, vec![a, r]);
        assert_eq!(d.node(a).unwrap().edges[0].kind, EdgeKind::Original);
        assert_eq!(d.node(r).unwrap().edges[0].kind, EdgeKind::Link);
    }

    #[test]
    fn test_deleting_original_promotes_next_link_in_traversal_order() {
        let mut d = Dialog::new();
        let a = d.add_node(NodeKind::Speaker, line("a"));
        let b = d.add_node(NodeKind::Speaker, line("b"));
        let r = d.add_node(NodeKind::Reply, line("shared"));
        d.add_start(Edge::to(a)).unwrap();
        d.add_start(Edge::to(b)).unwrap();
        d.add_edge(a, Edge::to(r)).unwrap();
        d.add_edge(b, Edge::to(r)).unwrap();

        d.delete_node(a);
        // The remaining reference is promoted; the node survives.
        assert!(d.contains(r));
        assert_eq!(d.node(b).unwrap().edges[0].kind, EdgeKind::Original);
    }

    #[test]
    fn test_start_order_breaks_ties() {
        let mut d = Dialog::new();
        let a = d.add_node(NodeKind::Speaker, line("first start"));
        let b = d.add_node(NodeKind::Speaker, line("second start"));
        d.add_start(Edge::to(a)).unwrap();
        d.add_start(Edge::to(b)).unwrap();

        let w = walk(&d, false);
        assert_eq!(w.order, vec![a, b]);
        assert_eq!(w.start_kinds, vec![EdgeKind::Original, EdgeKind::Original]);
    }

    #[test]
    fn test_every_reachable_node_has_exactly_one_original() {
        let mut d = Dialog::new();
        let a = d.add_node(NodeKind::Speaker, line("a"));
        let b = d.add_node(NodeKind::Speaker, line("b"));
        let r1 = d.add_node(NodeKind::Reply, line("r1"));
        let r2 = d.add_node(NodeKind::Reply, line("r2"));
        d.add_start(Edge::to(a)).unwrap();
        d.add_start(Edge::to(b)).unwrap();
        d.add_edge(a, Edge::to(r1)).unwrap();
        d.add_edge(a, Edge::to(r2)).unwrap();
        d.add_edge(b, Edge::to(r1)).unwrap();
        d.add_edge(r1, Edge::to(b)).unwrap();
        d.add_edge(r2, Edge::to(a)).unwrap();

        let mut originals: FxHashMap<NodeId, usize> = FxHashMap::default();
        for edge in &d.starts {
            if edge.kind == EdgeKind::Original {
                *originals.entry(edge.target).or_insert(0) += 1;
            }
        }
        for node in d.nodes() {
            for edge in &node.edges {
                if edge.kind == EdgeKind::Original {
                    *originals.entry(edge.target).or_insert(0) += 1;
                }
            }
        }

        for id in d.reachable() {
            assert_eq!(originals.get(&id), Some(&1), "node {id}");
        }
    }
}
