//! Build a small conversation in memory, encode it, decode it back and
//! print the graph. Run with `cargo run -p veles-dlg --example build_roundtrip`.

use veles_dlg::{Dialog, Edge, NodeKind};
use veles_gff::{LocString, ResRef};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut dialog = Dialog::new();

    let greeting = dialog.add_node(NodeKind::Speaker, LocString::inline(0, "Looking to trade?"));
    let buy = dialog.add_node(NodeKind::Reply, LocString::inline(0, "Show me your wares."));
    let leave = dialog.add_node(NodeKind::Reply, LocString::inline(0, "Not today."));
    let farewell = dialog.add_node(NodeKind::Speaker, LocString::inline(0, "Suit yourself."));

    dialog.add_start(Edge::to(greeting))?;
    dialog.add_edge(greeting, Edge::to(buy))?;
    dialog.add_edge(greeting, Edge::to(leave))?;
    dialog.add_edge(leave, Edge::to(farewell))?;
    dialog.node_mut(greeting).unwrap().speaker = Some("merchant".into());
    dialog.node_mut(buy).unwrap().script = Some(ResRef::new("sc_open_store")?);

    let bytes = dialog.to_bytes()?;
    println!("encoded {} bytes", bytes.len());

    let decoded = Dialog::parse(&bytes)?;
    for node in decoded.nodes() {
        println!(
            "{:?} {:?}: {}",
            node.kind,
            node.id(),
            node.text.first_text().unwrap_or("")
        );
        for edge in &node.edges {
            println!("  -> {:?} ({:?})", edge.target, edge.kind);
        }
    }
    Ok(())
}
