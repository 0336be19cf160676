//! In-memory conversation graph.
//!
//! A [`Dialog`] owns an arena of [`Node`]s keyed by [`NodeId`]. Edges store
//! handles, never nested ownership, so shared targets and cycles need no
//! reference counting. Whether an edge is the *original* introduction of its
//! target or a *link* to an already-introduced node is a property of
//! traversal order; the stored [`EdgeKind`] is a cache that
//! [`Dialog::reclassify`] rebuilds after every structural mutation.

use std::hash::BuildHasherDefault;

use hashbrown::{HashMap as FastHashMap, HashSet as FastHashSet};
use rustc_hash::FxHasher;
use veles_gff::{GffField, LocString, ResRef};

use crate::{Error, Result};

pub(crate) type FxHashMap<K, V> = FastHashMap<K, V, BuildHasherDefault<FxHasher>>;
pub(crate) type FxHashSet<T> = FastHashSet<T, BuildHasherDefault<FxHasher>>;

/// Stable handle to a node within one [`Dialog`].
///
/// Ids come from an arena-local counter, so handles from different dialogs
/// are unrelated and ids are never reused within one dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which side of the conversation speaks a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A line spoken by a character (an "entry" in the file).
    Speaker,
    /// A line spoken by the player (a "reply" in the file).
    Reply,
}

impl NodeKind {
    /// The kind an outgoing edge must target.
    pub fn opposite(self) -> Self {
        match self {
            Self::Speaker => Self::Reply,
            Self::Reply => Self::Speaker,
        }
    }
}

/// Whether an edge introduced its target or references a node introduced
/// elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// The first edge to reach the target in canonical traversal order.
    Original,
    /// Any later edge to the same target.
    Link,
}

/// A key/value pair passed to a node or guard script.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Param {
    /// Parameter name.
    pub key: String,
    /// Parameter value.
    pub value: String,
    /// Unrecognized fields of the parameter record, preserved.
    pub extra: Vec<GffField>,
}

impl Param {
    /// Create a parameter.
    pub fn new(key: &str, value: &str) -> Self {
        Self { key: key.to_string(), value: value.to_string(), extra: Vec::new() }
    }
}

/// A directed edge to another line.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// The target node.
    pub target: NodeId,
    /// Original or link; maintained by [`Dialog::reclassify`].
    pub kind: EdgeKind,
    /// Guard script deciding whether this transition is available.
    pub active: Option<ResRef>,
    /// Parameters passed to the guard script.
    pub condition_params: Vec<Param>,
    /// Author comment shown on link edges.
    pub link_comment: String,
    /// Unrecognized pointer fields, preserved.
    pub extra: Vec<GffField>,
}

impl Edge {
    /// Create a plain edge to a target. The kind is settled by the next
    /// [`Dialog::reclassify`].
    pub fn to(target: NodeId) -> Self {
        Self {
            target,
            kind: EdgeKind::Link,
            active: None,
            condition_params: Vec::new(),
            link_comment: String::new(),
            extra: Vec::new(),
        }
    }
}

/// One line of a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: NodeId,
    /// Who speaks this line.
    pub kind: NodeKind,
    /// The spoken text, per language.
    pub text: LocString,
    /// Speaker tag override; speaker lines only.
    pub speaker: Option<String>,
    /// Script fired when the line plays.
    pub script: Option<ResRef>,
    /// Parameters passed to the script.
    pub action_params: Vec<Param>,
    /// Voice-over resource.
    pub sound: Option<ResRef>,
    /// Animation id played with the line.
    pub animation: u32,
    /// Whether the animation loops.
    pub anim_loop: bool,
    /// Delay before the line plays.
    pub delay: u32,
    /// Linked quest tag, if this line advances a quest.
    pub quest: Option<String>,
    /// Quest stage reached, meaningful only with `quest`.
    pub quest_entry: Option<u32>,
    /// Author comment.
    pub comment: String,
    /// Outgoing edges, in presentation order.
    pub edges: Vec<Edge>,
    /// Unrecognized line fields, preserved.
    pub extra: Vec<GffField>,
}

impl Node {
    /// This node's handle.
    pub fn id(&self) -> NodeId {
        self.id
    }

    fn new(id: NodeId, kind: NodeKind, text: LocString) -> Self {
        Self {
            id,
            kind,
            text,
            speaker: None,
            script: None,
            action_params: Vec::new(),
            sound: None,
            animation: 0,
            anim_loop: false,
            delay: 0,
            quest: None,
            quest_entry: None,
            comment: String::new(),
            edges: Vec::new(),
            extra: Vec::new(),
        }
    }
}

/// A branching conversation: the node arena, the entry-point edges and the
/// end-of-conversation scripts.
///
/// Not thread-safe by design: one dialog belongs to one open document and
/// concurrent edits must be serialized by the owner.
#[derive(Debug, Default)]
pub struct Dialog {
    nodes: FxHashMap<NodeId, Node>,
    order: Vec<NodeId>,
    next_id: u32,
    /// Entry-point edges, in presentation order. Targets are speaker lines.
    pub starts: Vec<Edge>,
    /// Script run when the conversation ends normally.
    pub on_end: Option<ResRef>,
    /// Script run when the conversation is aborted.
    pub on_abort: Option<ResRef>,
    /// Default camera delay for speaker lines.
    pub delay_entry: u32,
    /// Default camera delay for player lines.
    pub delay_reply: u32,
    /// Word-count statistic maintained by the toolset.
    pub word_count: u32,
    /// Whether the camera may zoom in during the conversation.
    pub prevent_zoom: bool,
    /// Unrecognized top-level fields, preserved.
    pub extra: Vec<GffField>,
}

impl Dialog {
    /// Create an empty dialog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether a handle resolves to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Look up a node mutably.
    ///
    /// Structural changes made through this reference (editing `edges`)
    /// must be followed by [`Dialog::reclassify`].
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Node handles in creation order.
    pub fn node_ids(&self) -> &[NodeId] {
        &self.order
    }

    /// Nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Create a node and return its handle.
    pub fn add_node(&mut self, kind: NodeKind, text: LocString) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(id, kind, text));
        self.order.push(id);
        id
    }

    /// Re-insert a node removed by [`Dialog::delete_node`], keeping its id.
    ///
    /// Incoming edges are not restored; the caller's undo record owns those.
    pub fn restore_node(&mut self, node: Node) -> Result<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(Error::DuplicateNode(node.id));
        }
        self.next_id = self.next_id.max(node.id.0 + 1);
        self.order.push(node.id);
        self.nodes.insert(node.id, node);
        self.reclassify();
        Ok(())
    }

    /// Remove a node and every edge terminating at it.
    ///
    /// The removed node is returned with its outgoing edges intact so the
    /// caller can offer undo. Nodes that were only reachable through the
    /// removed one become orphan candidates; see
    /// [`Dialog::remove_orphaned_nodes`].
    pub fn delete_node(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&id)?;
        self.order.retain(|&n| n != id);
        self.starts.retain(|e| e.target != id);
        for other in self.nodes.values_mut() {
            other.edges.retain(|e| e.target != id);
        }
        self.reclassify();
        Some(node)
    }

    /// Remove a node from the arena without touching other nodes' edges.
    ///
    /// Used by orphan pruning, where no surviving node can reference the
    /// removed one. [`Dialog::delete_node`] is the general-purpose removal.
    pub(crate) fn take_node(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&id)?;
        self.order.retain(|&n| n != id);
        Some(node)
    }

    /// Add an outgoing edge to a node.
    pub fn add_edge(&mut self, from: NodeId, edge: Edge) -> Result<()> {
        let target = edge.target;
        let target_kind = self.nodes.get(&target).ok_or(Error::UnknownNode(target))?.kind;
        let source = self.nodes.get_mut(&from).ok_or(Error::UnknownNode(from))?;
        if source.kind == target_kind {
            return Err(Error::MismatchedEdge { from, to: target });
        }
        source.edges.push(edge);
        self.reclassify();
        Ok(())
    }

    /// Add an entry-point edge.
    pub fn add_start(&mut self, edge: Edge) -> Result<()> {
        let target = edge.target;
        let node = self.nodes.get(&target).ok_or(Error::UnknownNode(target))?;
        if node.kind != NodeKind::Speaker {
            return Err(Error::InvalidStart(target));
        }
        self.starts.push(edge);
        self.reclassify();
        Ok(())
    }

    /// Remove the first edge from `from` to `target`, returning it.
    pub fn remove_edge(&mut self, from: NodeId, target: NodeId) -> Option<Edge> {
        let node = self.nodes.get_mut(&from)?;
        let at = node.edges.iter().position(|e| e.target == target)?;
        let edge = node.edges.remove(at);
        self.reclassify();
        Some(edge)
    }

    /// Remove the first entry-point edge targeting `target`, returning it.
    pub fn remove_start(&mut self, target: NodeId) -> Option<Edge> {
        let at = self.starts.iter().position(|e| e.target == target)?;
        let edge = self.starts.remove(at);
        self.reclassify();
        Some(edge)
    }

    /// Move the first edge `from -> target` so it leaves `new_from` instead.
    ///
    /// The edge keeps its guard script and parameters.
    pub fn reparent_edge(&mut self, from: NodeId, target: NodeId, new_from: NodeId) -> Result<()> {
        if !self.nodes.contains_key(&new_from) {
            return Err(Error::UnknownNode(new_from));
        }
        let source = self.nodes.get_mut(&from).ok_or(Error::UnknownNode(from))?;
        let at = source
            .edges
            .iter()
            .position(|e| e.target == target)
            .ok_or(Error::UnknownEdge { from, to: target })?;
        let edge = source.edges.remove(at);
        self.add_edge(new_from, edge)
    }

    /// Duplicate a node as an independent copy.
    ///
    /// The copy shares no identity with the source: it gets a new id and
    /// clones the content and outgoing edges. It has no incoming edges until
    /// the caller adds one.
    pub fn duplicate_as_copy(&mut self, id: NodeId) -> Result<NodeId> {
        let source = self.nodes.get(&id).ok_or(Error::UnknownNode(id))?.clone();
        let new_id = NodeId(self.next_id);
        self.next_id += 1;
        let mut copy = source;
        copy.id = new_id;
        self.nodes.insert(new_id, copy);
        self.order.push(new_id);
        self.reclassify();
        Ok(new_id)
    }

    /// Reference an existing node from another parent.
    ///
    /// This adds a plain edge; traversal order decides whether it classifies
    /// as the original introduction or a link.
    pub fn duplicate_as_link(&mut self, from: NodeId, target: NodeId) -> Result<()> {
        self.add_edge(from, Edge::to(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> LocString {
        LocString::inline(0, text)
    }

    #[test]
    fn test_ids_are_arena_local_and_monotonic() {
        let mut a = Dialog::new();
        let mut b = Dialog::new();

        let a0 = a.add_node(NodeKind::Speaker, line("hi"));
        let a1 = a.add_node(NodeKind::Reply, line("hello"));
        let b0 = b.add_node(NodeKind::Speaker, line("unrelated"));

        assert_ne!(a0, a1);
        assert_eq!(a0, b0); // counters are per-dialog, not global
    }

    #[test]
    fn test_edges_must_alternate_kinds() {
        let mut d = Dialog::new();
        let a = d.add_node(NodeKind::Speaker, line("one"));
        let b = d.add_node(NodeKind::Speaker, line("two"));
        let r = d.add_node(NodeKind::Reply, line("sure"));

        assert!(d.add_edge(a, Edge::to(r)).is_ok());
        assert!(matches!(
            d.add_edge(a, Edge::to(b)),
            Err(Error::MismatchedEdge { .. })
        ));
        assert!(matches!(
            d.add_start(Edge::to(r)),
            Err(Error::InvalidStart(_))
        ));
    }

    #[test]
    fn test_delete_node_removes_incoming_edges() {
        let mut d = Dialog::new();
        let a = d.add_node(NodeKind::Speaker, line("one"));
        let r = d.add_node(NodeKind::Reply, line("sure"));
        d.add_start(Edge::to(a)).unwrap();
        d.add_edge(a, Edge::to(r)).unwrap();

        let removed = d.delete_node(r).unwrap();
        assert_eq!(removed.id(), r);
        assert!(d.node(a).unwrap().edges.is_empty());
        assert!(!d.contains(r));
    }

    #[test]
    fn test_restore_after_delete_keeps_id() {
        let mut d = Dialog::new();
        let a = d.add_node(NodeKind::Speaker, line("one"));
        let node = d.delete_node(a).unwrap();

        d.restore_node(node).unwrap();
        assert!(d.contains(a));

        // Restoring twice is an error.
        let node = d.delete_node(a).unwrap();
        d.restore_node(node.clone()).unwrap();
        assert!(matches!(d.restore_node(node), Err(Error::DuplicateNode(_))));
    }

    #[test]
    fn test_duplicate_as_copy_is_independent() {
        let mut d = Dialog::new();
        let a = d.add_node(NodeKind::Speaker, line("original"));
        let r = d.add_node(NodeKind::Reply, line("sure"));
        d.add_edge(a, Edge::to(r)).unwrap();

        let copy = d.duplicate_as_copy(a).unwrap();
        assert_ne!(copy, a);
        assert_eq!(d.node(copy).unwrap().edges.len(), 1);

        // Editing the copy leaves the source untouched.
        d.node_mut(copy).unwrap().comment = "copied".into();
        assert_eq!(d.node(a).unwrap().comment, "");
    }

    #[test]
    fn test_reparent_edge() {
        let mut d = Dialog::new();
        let a = d.add_node(NodeKind::Speaker, line("a"));
        let b = d.add_node(NodeKind::Speaker, line("b"));
        let r = d.add_node(NodeKind::Reply, line("r"));
        d.add_edge(a, Edge::to(r)).unwrap();

        d.reparent_edge(a, r, b).unwrap();
        assert!(d.node(a).unwrap().edges.is_empty());
        assert_eq!(d.node(b).unwrap().edges[0].target, r);
    }
}
