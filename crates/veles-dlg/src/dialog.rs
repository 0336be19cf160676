//! Dialogue file mapping.
//!
//! Maps between the container's generic tree and the [`Dialog`] graph. The
//! file stores speaker lines and player lines in two flat tables; pointer
//! records (row index, guard script, child flag) wire them into a directed
//! graph with shared targets. Decode walks the entry points depth-first and
//! creates one node per visited row; encode re-emits the tables in the same
//! discovery order, so a no-op load/save cycle keeps table order stable.
//!
//! Every field this overlay does not recognize is preserved verbatim and
//! re-emitted on encode. That holds for the root, every line, every pointer
//! and every script parameter, so engine-version extensions survive a
//! load/save cycle untouched.

use std::path::Path;

use tracing::warn;
use veles_gff::{GffBuilder, GffContainer, GffStruct, LocString, ResRef, Value};

use crate::graph::{Dialog, Edge, EdgeKind, FxHashMap, NodeId, NodeKind, Param};
use crate::walk::walk;
use crate::Result;

impl Param {
    fn from_gff(mut s: GffStruct) -> Self {
        Self {
            key: s.take_str("Key").unwrap_or_default(),
            value: s.take_str("Value").unwrap_or_default(),
            extra: s.fields,
        }
    }

    fn to_gff(&self) -> Result<GffStruct> {
        let mut s = GffStruct::new();
        s.add("Key", Value::String(self.key.clone()))?;
        s.add("Value", Value::String(self.value.clone()))?;
        s.fields.extend(self.extra.iter().cloned());
        Ok(s)
    }
}

/// A pointer record, decoded but not yet resolved to a node.
struct RawPointer {
    index: Option<u32>,
    active: Option<ResRef>,
    condition_params: Vec<Param>,
    link_comment: String,
    extra: Vec<veles_gff::GffField>,
}

impl RawPointer {
    fn decode(mut s: GffStruct) -> Self {
        let index = s.take_u32("Index");
        // The stored child flag is a cache of traversal order; it is
        // recomputed after load, so only consume it here.
        let _ = s.take_u8("IsChild");
        Self {
            index,
            active: s.take_resref("Active"),
            condition_params: s
                .take_list("ConditionParams")
                .unwrap_or_default()
                .into_iter()
                .map(Param::from_gff)
                .collect(),
            link_comment: s.take_str("LinkComment").unwrap_or_default(),
            extra: s.fields,
        }
    }

    fn into_edge(self, target: NodeId) -> Edge {
        Edge {
            target,
            kind: EdgeKind::Link,
            active: self.active,
            condition_params: self.condition_params,
            link_comment: self.link_comment,
            extra: self.extra,
        }
    }
}

/// A line record, decoded but not yet placed in the graph.
struct RawLine {
    text: LocString,
    speaker: Option<String>,
    script: Option<ResRef>,
    action_params: Vec<Param>,
    sound: Option<ResRef>,
    animation: u32,
    anim_loop: bool,
    delay: u32,
    quest: Option<String>,
    quest_entry: Option<u32>,
    comment: String,
    pointers: Vec<RawPointer>,
    extra: Vec<veles_gff::GffField>,
}

impl RawLine {
    fn decode(kind: NodeKind, mut s: GffStruct) -> Self {
        let pointer_label = match kind {
            NodeKind::Speaker => "RepliesList",
            NodeKind::Reply => "EntriesList",
        };
        let pointers = s
            .take_list(pointer_label)
            .unwrap_or_default()
            .into_iter()
            .map(RawPointer::decode)
            .collect();
        let speaker = match kind {
            NodeKind::Speaker => s.take_str("Speaker"),
            NodeKind::Reply => None,
        };
        Self {
            text: s.take_loc("Text").unwrap_or_default(),
            speaker,
            script: s.take_resref("Script"),
            action_params: s
                .take_list("ActionParams")
                .unwrap_or_default()
                .into_iter()
                .map(Param::from_gff)
                .collect(),
            sound: s.take_resref("Sound"),
            animation: s.take_u32("Animation").unwrap_or(0),
            anim_loop: s.take_u8("AnimLoop").unwrap_or(0) != 0,
            delay: s.take_u32("Delay").unwrap_or(0),
            quest: s.take_str("Quest"),
            quest_entry: s.take_u32("QuestEntry"),
            comment: s.take_str("Comment").unwrap_or_default(),
            pointers,
            extra: s.fields,
        }
    }
}

/// Graph construction state shared between the entry-point walk and the
/// stranded-row sweep.
struct Loader {
    entries: Vec<Option<RawLine>>,
    replies: Vec<Option<RawLine>>,
    visited: FxHashMap<(NodeKind, u32), NodeId>,
}

impl Loader {
    /// Materialize one row as a node, if the row exists and was not visited.
    fn create(
        &mut self,
        dialog: &mut Dialog,
        kind: NodeKind,
        row: u32,
    ) -> Option<(NodeId, Vec<RawPointer>)> {
        let table = match kind {
            NodeKind::Speaker => &mut self.entries,
            NodeKind::Reply => &mut self.replies,
        };
        let raw = table.get_mut(row as usize)?.take()?;

        let id = dialog.add_node(kind, raw.text);
        if let Some(node) = dialog.node_mut(id) {
            node.speaker = raw.speaker;
            node.script = raw.script;
            node.action_params = raw.action_params;
            node.sound = raw.sound;
            node.animation = raw.animation;
            node.anim_loop = raw.anim_loop;
            node.delay = raw.delay;
            node.quest = raw.quest;
            node.quest_entry = raw.quest_entry;
            node.comment = raw.comment;
            node.extra = raw.extra;
        }
        self.visited.insert((kind, row), id);
        Some((id, raw.pointers))
    }

    /// Depth-first materialization below an already-created node.
    ///
    /// The visited check happens before a target row is entered, so shared
    /// targets become edges to the existing node and cycles terminate.
    fn drain(
        &mut self,
        dialog: &mut Dialog,
        root: NodeId,
        root_kind: NodeKind,
        pointers: Vec<RawPointer>,
    ) {
        let mut stack = vec![(root, root_kind, pointers.into_iter())];

        loop {
            let Some(frame) = stack.last_mut() else { break };
            let (from, kind) = (frame.0, frame.1);
            let Some(ptr) = frame.2.next() else {
                stack.pop();
                continue;
            };

            let child_kind = kind.opposite();
            let Some(index) = ptr.index else {
                warn!(node = %from, "pointer without an Index field, skipped");
                continue;
            };

            let existing = self.visited.get(&(child_kind, index)).copied();
            let target = if let Some(existing) = existing {
                Some(existing)
            } else if let Some((child, child_ptrs)) = self.create(dialog, child_kind, index) {
                stack.push((child, child_kind, child_ptrs.into_iter()));
                Some(child)
            } else {
                warn!(node = %from, index, "pointer target row out of range, edge skipped");
                None
            };

            if let Some(target) = target {
                if let Some(node) = dialog.node_mut(from) {
                    node.edges.push(ptr.into_edge(target));
                }
            }
        }
    }
}

impl Dialog {
    /// File-type tag of dialogue containers.
    pub const FILE_TYPE: [u8; 4] = *b"DLG ";

    /// Read and decode a dialogue file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::parse(&data)
    }

    /// Decode a dialogue file from bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let container = GffContainer::parse(data)?;
        if container.file_type() != Self::FILE_TYPE {
            return Err(crate::Error::WrongFileType {
                expected: String::from_utf8_lossy(&Self::FILE_TYPE).into_owned(),
                actual: container.file_type_str(),
            });
        }
        Self::from_gff(container.root()?)
    }

    /// Build the graph from a decoded container tree.
    pub fn from_gff(mut root: GffStruct) -> Result<Self> {
        let mut dialog = Dialog::new();
        dialog.delay_entry = root.take_u32("DelayEntry").unwrap_or(0);
        dialog.delay_reply = root.take_u32("DelayReply").unwrap_or(0);
        dialog.word_count = root.take_u32("NumWords").unwrap_or(0);
        dialog.on_end = root.take_resref("EndConversation");
        dialog.on_abort = root.take_resref("EndConverAbort");
        dialog.prevent_zoom = root.take_u8("PreventZoomIn").unwrap_or(0) != 0;

        let entries = root.take_list("EntryList").unwrap_or_default();
        let replies = root.take_list("ReplyList").unwrap_or_default();
        let start_structs = root.take_list("StartingList").unwrap_or_default();
        dialog.extra = root.fields;

        let mut loader = Loader {
            entries: entries
                .into_iter()
                .map(|s| Some(RawLine::decode(NodeKind::Speaker, s)))
                .collect(),
            replies: replies
                .into_iter()
                .map(|s| Some(RawLine::decode(NodeKind::Reply, s)))
                .collect(),
            visited: FxHashMap::default(),
        };

        for start in start_structs {
            let ptr = RawPointer::decode(start);
            let Some(index) = ptr.index else {
                warn!("entry point without an Index field, skipped");
                continue;
            };
            let existing = loader.visited.get(&(NodeKind::Speaker, index)).copied();
            let target = if let Some(id) = existing {
                Some(id)
            } else if let Some((id, ptrs)) = loader.create(&mut dialog, NodeKind::Speaker, index) {
                loader.drain(&mut dialog, id, NodeKind::Speaker, ptrs);
                Some(id)
            } else {
                warn!(index, "entry point targets a missing row, skipped");
                None
            };
            if let Some(target) = target {
                dialog.starts.push(ptr.into_edge(target));
            }
        }

        // Rows no entry point reaches are kept rather than dropped: they
        // show up as orphan candidates and only vanish through an explicit,
        // logged repair.
        let before = dialog.len();
        let (entry_count, reply_count) = (loader.entries.len(), loader.replies.len());
        for row in 0..entry_count {
            if let Some((id, ptrs)) = loader.create(&mut dialog, NodeKind::Speaker, row as u32) {
                loader.drain(&mut dialog, id, NodeKind::Speaker, ptrs);
            }
        }
        for row in 0..reply_count {
            if let Some((id, ptrs)) = loader.create(&mut dialog, NodeKind::Reply, row as u32) {
                loader.drain(&mut dialog, id, NodeKind::Reply, ptrs);
            }
        }
        let stranded = dialog.len() - before;
        if stranded > 0 {
            warn!(stranded, "unreachable lines retained; orphan pruning will drop them");
        }

        dialog.reclassify();
        Ok(dialog)
    }

    /// Serialize the graph back into a container tree.
    ///
    /// Lines are emitted in canonical traversal order and pointer indices
    /// rewritten against the new table layout. Edge child flags are written
    /// from the recomputed classification, never from stale state.
    pub fn to_gff(&self) -> Result<GffStruct> {
        let order = walk(self, true).order;
        let mut entry_rows = Vec::new();
        let mut reply_rows = Vec::new();
        for &id in &order {
            match self.node(id).map(|n| n.kind) {
                Some(NodeKind::Speaker) => entry_rows.push(id),
                Some(NodeKind::Reply) => reply_rows.push(id),
                None => {}
            }
        }
        let entry_index: FxHashMap<NodeId, u32> =
            entry_rows.iter().enumerate().map(|(i, &id)| (id, i as u32)).collect();
        let reply_index: FxHashMap<NodeId, u32> =
            reply_rows.iter().enumerate().map(|(i, &id)| (id, i as u32)).collect();

        let mut root = GffStruct::new();
        root.add("DelayEntry", Value::Dword(self.delay_entry))?;
        root.add("DelayReply", Value::Dword(self.delay_reply))?;
        root.add("NumWords", Value::Dword(self.word_count))?;
        if let Some(script) = &self.on_end {
            root.add("EndConversation", Value::ResRef(script.clone()))?;
        }
        if let Some(script) = &self.on_abort {
            root.add("EndConverAbort", Value::ResRef(script.clone()))?;
        }
        root.add("PreventZoomIn", Value::Byte(self.prevent_zoom as u8))?;

        let mut entries = Vec::with_capacity(entry_rows.len());
        for &id in &entry_rows {
            entries.push(self.line_to_gff(id, &entry_index, &reply_index)?);
        }
        root.add("EntryList", Value::List(entries))?;

        let mut replies = Vec::with_capacity(reply_rows.len());
        for &id in &reply_rows {
            replies.push(self.line_to_gff(id, &entry_index, &reply_index)?);
        }
        root.add("ReplyList", Value::List(replies))?;

        let mut starts = Vec::with_capacity(self.starts.len());
        for edge in &self.starts {
            match entry_index.get(&edge.target) {
                Some(&row) => starts.push(pointer_to_gff(edge, row, false)?),
                None => warn!(to = %edge.target, "entry point to a missing node, dropped"),
            }
        }
        root.add("StartingList", Value::List(starts))?;

        root.fields.extend(self.extra.iter().cloned());
        Ok(root)
    }

    /// Encode the graph as dialogue file bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(GffBuilder::encode(&self.to_gff()?, Self::FILE_TYPE))
    }

    /// Encode and write the graph to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    fn line_to_gff(
        &self,
        id: NodeId,
        entry_index: &FxHashMap<NodeId, u32>,
        reply_index: &FxHashMap<NodeId, u32>,
    ) -> Result<GffStruct> {
        // The row ids come from the traversal, so the node exists; an empty
        // struct would only ever appear on internal inconsistency.
        let Some(node) = self.node(id) else { return Ok(GffStruct::new()) };

        let mut s = GffStruct::new();
        s.add("Text", Value::LocString(node.text.clone()))?;
        if node.kind == NodeKind::Speaker {
            if let Some(speaker) = &node.speaker {
                s.add("Speaker", Value::String(speaker.clone()))?;
            }
        }
        if let Some(script) = &node.script {
            s.add("Script", Value::ResRef(script.clone()))?;
        }
        if !node.action_params.is_empty() {
            let params: Result<Vec<_>> = node.action_params.iter().map(Param::to_gff).collect();
            s.add("ActionParams", Value::List(params?))?;
        }
        if let Some(sound) = &node.sound {
            s.add("Sound", Value::ResRef(sound.clone()))?;
        }
        s.add("Animation", Value::Dword(node.animation))?;
        s.add("AnimLoop", Value::Byte(node.anim_loop as u8))?;
        s.add("Delay", Value::Dword(node.delay))?;
        if let Some(quest) = &node.quest {
            s.add("Quest", Value::String(quest.clone()))?;
        }
        if let Some(stage) = node.quest_entry {
            s.add("QuestEntry", Value::Dword(stage))?;
        }
        if !node.comment.is_empty() {
            s.add("Comment", Value::String(node.comment.clone()))?;
        }

        let (pointer_label, target_index) = match node.kind {
            NodeKind::Speaker => ("RepliesList", reply_index),
            NodeKind::Reply => ("EntriesList", entry_index),
        };
        let mut pointers = Vec::with_capacity(node.edges.len());
        for edge in &node.edges {
            match target_index.get(&edge.target) {
                Some(&row) => pointers.push(pointer_to_gff(edge, row, true)?),
                None => {
                    warn!(node = %id, to = %edge.target, "edge to a missing node, dropped")
                }
            }
        }
        s.add(pointer_label, Value::List(pointers))?;

        s.fields.extend(node.extra.iter().cloned());
        Ok(s)
    }
}

fn pointer_to_gff(edge: &Edge, row: u32, with_child_flag: bool) -> Result<GffStruct> {
    let mut s = GffStruct::new();
    s.add("Index", Value::Dword(row))?;
    if let Some(active) = &edge.active {
        s.add("Active", Value::ResRef(active.clone()))?;
    }
    if !edge.condition_params.is_empty() {
        let params: Result<Vec<_>> = edge.condition_params.iter().map(Param::to_gff).collect();
        s.add("ConditionParams", Value::List(params?))?;
    }
    if with_child_flag {
        s.add("IsChild", Value::Byte((edge.kind == EdgeKind::Link) as u8))?;
    }
    if !edge.link_comment.is_empty() {
        s.add("LinkComment", Value::String(edge.link_comment.clone()))?;
    }
    s.fields.extend(edge.extra.iter().cloned());
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> LocString {
        LocString::inline(0, text)
    }

    fn find(dialog: &Dialog, text: &str) -> NodeId {
        dialog
            .nodes()
            .find(|n| n.text.first_text() == Some(text))
            .map(|n| n.id())
            .unwrap()
    }

    /// Two entry points sharing one reply, per the classic shared-subtree
    /// shape: A -> R original, B -> R link.
    fn shared_reply_dialog() -> Dialog {
        let mut d = Dialog::new();
        let a = d.add_node(NodeKind::Speaker, line("A"));
        let b = d.add_node(NodeKind::Speaker, line("B"));
        let r = d.add_node(NodeKind::Reply, line("R"));
        d.add_start(Edge::to(a)).unwrap();
        d.add_start(Edge::to(b)).unwrap();
        d.add_edge(a, Edge::to(r)).unwrap();
        d.add_edge(b, Edge::to(r)).unwrap();
        d
    }

    #[test]
    fn test_round_trip_shared_reply() {
        let bytes = shared_reply_dialog().to_bytes().unwrap();
        let d = Dialog::parse(&bytes).unwrap();

        assert_eq!(d.len(), 3);
        assert_eq!(d.starts.len(), 2);

        let a = find(&d, "A");
        let b = find(&d, "B");
        let r = find(&d, "R");
        assert_eq!(d.node(a).unwrap().edges[0].target, r);
        assert_eq!(d.node(a).unwrap().edges[0].kind, EdgeKind::Original);
        assert_eq!(d.node(b).unwrap().edges[0].target, r);
        assert_eq!(d.node(b).unwrap().edges[0].kind, EdgeKind::Link);
    }

    #[test]
    fn test_delete_and_undo_restores_original_classification() {
        let bytes = shared_reply_dialog().to_bytes().unwrap();
        let mut d = Dialog::parse(&bytes).unwrap();
        let a = find(&d, "A");
        let b = find(&d, "B");
        let r = find(&d, "R");

        let start_edge = d.starts[0].clone();
        let removed = d.delete_node(a).unwrap();

        // B's reference was promoted while A was gone.
        assert_eq!(d.node(b).unwrap().edges[0].kind, EdgeKind::Original);

        // Undo: put the node and its entry point back where they were.
        d.restore_node(removed).unwrap();
        d.starts.insert(0, start_edge);
        d.reclassify();

        assert_eq!(d.node(a).unwrap().edges[0].kind, EdgeKind::Original);
        assert_eq!(d.node(b).unwrap().edges[0].kind, EdgeKind::Link);
        assert_eq!(d.node(a).unwrap().edges[0].target, r);
    }

    #[test]
    fn test_domain_round_trip_identity() {
        let mut source = shared_reply_dialog();
        let a = find(&source, "A");
        source.node_mut(a).unwrap().script = Some(ResRef::new("sc_greet").unwrap());
        source.node_mut(a).unwrap().action_params = vec![Param::new("mood", "cheerful")];
        source.on_end = Some(ResRef::new("sc_end").unwrap());
        source.reclassify();

        let first = Dialog::parse(&source.to_bytes().unwrap()).unwrap();
        let second = Dialog::parse(&first.to_bytes().unwrap()).unwrap();

        assert_eq!(first.len(), second.len());
        assert_eq!(first.starts.len(), second.starts.len());
        for (x, y) in first.nodes().zip(second.nodes()) {
            assert_eq!(x, y);
        }
        assert_eq!(first.on_end, second.on_end);
    }

    #[test]
    fn test_second_generation_bytes_identical() {
        let gen1 = shared_reply_dialog().to_bytes().unwrap();
        let gen2 = Dialog::parse(&gen1).unwrap().to_bytes().unwrap();
        assert_eq!(gen1, gen2);
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        // A line with an extension field this overlay knows nothing about.
        let entry = GffStruct::new()
            .with("Text", Value::LocString(line("hello")))
            .unwrap()
            .with("VoiceMood", Value::Dword(7))
            .unwrap()
            .with("RepliesList", Value::List(vec![]))
            .unwrap();
        let start = GffStruct::new().with("Index", Value::Dword(0)).unwrap();
        let root = GffStruct::new()
            .with("Hue", Value::Float(0.25))
            .unwrap()
            .with("EntryList", Value::List(vec![entry]))
            .unwrap()
            .with("ReplyList", Value::List(vec![]))
            .unwrap()
            .with("StartingList", Value::List(vec![start]))
            .unwrap();

        let d = Dialog::from_gff(root).unwrap();
        let node = d.nodes().next().unwrap();
        assert_eq!(node.extra.len(), 1);
        assert_eq!(node.extra[0].value, Value::Dword(7));
        assert_eq!(d.extra.len(), 1);

        // Byte-identical from the first overlay generation onwards.
        let gen1 = d.to_bytes().unwrap();
        let gen2 = Dialog::parse(&gen1).unwrap().to_bytes().unwrap();
        assert_eq!(gen1, gen2);

        // And the unknown fields are still there.
        let reparsed = Dialog::parse(&gen1).unwrap();
        let node = reparsed.nodes().next().unwrap();
        assert_eq!(node.extra[0].label.as_str(), "VoiceMood");
        assert_eq!(reparsed.extra[0].label.as_str(), "Hue");
    }

    #[test]
    fn test_dangling_pointer_is_skipped_not_followed() {
        let entry = GffStruct::new()
            .with("Text", Value::LocString(line("hello")))
            .unwrap()
            .with(
                "RepliesList",
                Value::List(vec![GffStruct::new()
                    .with("Index", Value::Dword(99))
                    .unwrap()]),
            )
            .unwrap();
        let start = GffStruct::new().with("Index", Value::Dword(0)).unwrap();
        let root = GffStruct::new()
            .with("EntryList", Value::List(vec![entry]))
            .unwrap()
            .with("ReplyList", Value::List(vec![]))
            .unwrap()
            .with("StartingList", Value::List(vec![start]))
            .unwrap();

        let d = Dialog::from_gff(root).unwrap();
        assert_eq!(d.len(), 1);
        assert!(d.nodes().next().unwrap().edges.is_empty());
    }

    #[test]
    fn test_stranded_rows_are_retained_as_orphan_candidates() {
        // A reply row exists but nothing points at it.
        let entry = GffStruct::new()
            .with("Text", Value::LocString(line("hello")))
            .unwrap()
            .with("RepliesList", Value::List(vec![]))
            .unwrap();
        let stray = GffStruct::new()
            .with("Text", Value::LocString(line("never shown")))
            .unwrap()
            .with("EntriesList", Value::List(vec![]))
            .unwrap();
        let start = GffStruct::new().with("Index", Value::Dword(0)).unwrap();
        let root = GffStruct::new()
            .with("EntryList", Value::List(vec![entry]))
            .unwrap()
            .with("ReplyList", Value::List(vec![stray]))
            .unwrap()
            .with("StartingList", Value::List(vec![start]))
            .unwrap();

        let mut d = Dialog::from_gff(root).unwrap();
        assert_eq!(d.len(), 2);

        let removed = d.remove_orphaned_nodes();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].text.first_text(), Some("never shown"));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn test_speaker_and_quest_fields_round_trip() {
        let mut d = Dialog::new();
        let a = d.add_node(NodeKind::Speaker, line("Psst, over here."));
        {
            let node = d.node_mut(a).unwrap();
            node.speaker = Some("smuggler".into());
            node.quest = Some("q_contraband".into());
            node.quest_entry = Some(20);
            node.sound = Some(ResRef::new("vo_smug_01").unwrap());
            node.comment = "opening line".into();
        }
        d.add_start(Edge::to(a)).unwrap();

        let parsed = Dialog::parse(&d.to_bytes().unwrap()).unwrap();
        let node = parsed.nodes().next().unwrap();
        assert_eq!(node.speaker.as_deref(), Some("smuggler"));
        assert_eq!(node.quest.as_deref(), Some("q_contraband"));
        assert_eq!(node.quest_entry, Some(20));
        assert_eq!(node.sound.as_ref().unwrap().as_str(), "vo_smug_01");
        assert_eq!(node.comment, "opening line");
    }
}
