//! Reachability repairs.
//!
//! Two deterministic, idempotent repairs: dropping edges whose target no
//! longer exists, and pruning nodes no entry point reaches. Removed nodes
//! are returned to the caller so an editor can offer undo instead of losing
//! them; both repairs log what they did.

use tracing::info;

use crate::graph::{Dialog, FxHashSet, Node, NodeId};
use crate::walk::walk;

impl Dialog {
    /// Remove every edge whose target node is no longer in the arena.
    ///
    /// Dangling edges appear after bulk node removal without edge cleanup.
    /// Returns the number of edges removed. Running the repair again with no
    /// mutation in between removes nothing.
    pub fn remove_orphaned_pointers(&mut self) -> usize {
        let valid: FxHashSet<NodeId> = self.nodes().map(Node::id).collect();
        let mut removed = 0;

        self.starts.retain(|e| {
            let keep = valid.contains(&e.target);
            removed += usize::from(!keep);
            keep
        });

        let ids: Vec<NodeId> = self.node_ids().to_vec();
        for id in ids {
            if let Some(node) = self.node_mut(id) {
                node.edges.retain(|e| {
                    let keep = valid.contains(&e.target);
                    removed += usize::from(!keep);
                    keep
                });
            }
        }

        if removed > 0 {
            info!(removed, "removed dangling pointers");
            self.reclassify();
        }
        removed
    }

    /// Remove every node unreachable from the entry points.
    ///
    /// Reachability follows every edge, original or link. Removed nodes are
    /// returned in creation order, each with its outgoing edges intact, so
    /// the caller can restore them. A second run with no mutation in between
    /// removes nothing: pruning cannot make a reachable node unreachable,
    /// because any edge into the reachable set from a pruned node would have
    /// made the pruned node reachable itself.
    pub fn remove_orphaned_nodes(&mut self) -> Vec<Node> {
        let reachable: FxHashSet<NodeId> = walk(self, false).order.into_iter().collect();
        let doomed: Vec<NodeId> = self
            .node_ids()
            .iter()
            .copied()
            .filter(|id| !reachable.contains(id))
            .collect();

        let mut removed = Vec::with_capacity(doomed.len());
        for id in doomed {
            if let Some(node) = self.take_node(id) {
                removed.push(node);
            }
        }

        if !removed.is_empty() {
            info!(count = removed.len(), "pruned unreachable nodes");
            self.reclassify();
        }
        removed
    }
}
