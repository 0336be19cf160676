//! Veles CLI - command-line tool for inspecting and repairing game resource
//! container files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use veles::prelude::*;

/// Veles - game resource container toolkit
#[derive(Parser)]
#[command(name = "veles")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show header and table statistics for a container file
    Info {
        /// Input container file
        input: PathBuf,
    },

    /// Dump a container file as JSON
    Dump {
        /// Input container file
        input: PathBuf,

        /// Output JSON file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Lint dialogue files: graph statistics, dangling pointers, orphans
    Check {
        /// Dialogue file or directory
        input: PathBuf,

        /// Recurse into directories, checking every .dlg file
        #[arg(short, long)]
        recursive: bool,
    },

    /// Remove dangling pointers and unreachable lines from a dialogue file
    Scrub {
        /// Input dialogue file
        input: PathBuf,

        /// Output file (rewrites the input if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode and re-encode a container file
    Repack {
        /// Input container file
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { input } => cmd_info(&input)?,
        Commands::Dump { input, output } => cmd_dump(&input, output.as_deref())?,
        Commands::Check { input, recursive } => cmd_check(&input, recursive)?,
        Commands::Scrub { input, output } => cmd_scrub(&input, output.as_deref())?,
        Commands::Repack { input, output } => cmd_repack(&input, &output)?,
    }

    Ok(())
}

fn cmd_info(input: &Path) -> Result<()> {
    let data = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let container =
        GffContainer::parse(&data).with_context(|| format!("parsing {}", input.display()))?;

    println!("{}", input.display());
    println!("  type:           {}", container.file_type_str());
    println!("  size:           {} bytes", data.len());
    println!("  structs:        {}", container.struct_entries().len());
    println!("  fields:         {}", container.field_entries().len());
    println!("  labels:         {}", container.labels().len());
    println!("  field data:     {} bytes", container.field_data().len());
    println!("  field indices:  {}", container.field_indices().len());
    println!("  list indices:   {}", container.list_indices().len());
    Ok(())
}

fn cmd_dump(input: &Path, output: Option<&Path>) -> Result<()> {
    let container =
        GffContainer::open(input).with_context(|| format!("parsing {}", input.display()))?;
    let root = container.root().context("reifying root struct")?;

    let json = serde_json::to_string_pretty(&root.to_json())?;
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_check(input: &Path, recursive: bool) -> Result<()> {
    if !recursive {
        return check_one(input);
    }

    let mut checked = 0usize;
    let mut failed = 0usize;
    for entry in walkdir::WalkDir::new(input) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_dialogue = entry
            .path()
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("dlg"));
        if !is_dialogue {
            continue;
        }
        checked += 1;
        if let Err(err) = check_one(entry.path()) {
            eprintln!("{}: {err:#}", entry.path().display());
            failed += 1;
        }
    }
    println!("\nChecked {checked} files, {failed} failed");
    Ok(())
}

fn check_one(path: &Path) -> Result<()> {
    let dialog = Dialog::open(path).with_context(|| format!("loading {}", path.display()))?;

    let speakers = dialog.nodes().filter(|n| n.kind == NodeKind::Speaker).count();
    let replies = dialog.len() - speakers;
    let mut edges = 0usize;
    let mut links = 0usize;
    let mut dangling = 0usize;
    for node in dialog.nodes() {
        for edge in &node.edges {
            edges += 1;
            links += usize::from(edge.kind == EdgeKind::Link);
            dangling += usize::from(!dialog.contains(edge.target));
        }
    }
    let orphans = dialog.len() - dialog.reachable().len();

    println!("{}", path.display());
    println!(
        "  lines:        {} ({speakers} speaker, {replies} player)",
        dialog.len()
    );
    println!("  entry points: {}", dialog.starts.len());
    println!("  edges:        {edges} ({links} links)");
    if dangling > 0 {
        println!("  dangling:     {dangling} pointer(s) - run scrub");
    }
    if orphans > 0 {
        println!("  orphans:      {orphans} unreachable line(s) - run scrub");
    }
    Ok(())
}

fn cmd_scrub(input: &Path, output: Option<&Path>) -> Result<()> {
    let mut dialog =
        Dialog::open(input).with_context(|| format!("loading {}", input.display()))?;

    let edges = dialog.remove_orphaned_pointers();
    let nodes = dialog.remove_orphaned_nodes();

    let target = output.unwrap_or(input);
    dialog
        .save(target)
        .with_context(|| format!("writing {}", target.display()))?;
    println!(
        "Removed {edges} dangling pointer(s) and {} unreachable line(s); wrote {}",
        nodes.len(),
        target.display()
    );
    Ok(())
}

fn cmd_repack(input: &Path, output: &Path) -> Result<()> {
    let data = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let container =
        GffContainer::parse(&data).with_context(|| format!("parsing {}", input.display()))?;
    let root = container.root().context("reifying root struct")?;

    let rebuilt = GffBuilder::encode(&root, container.file_type());
    std::fs::write(output, &rebuilt).with_context(|| format!("writing {}", output.display()))?;
    println!(
        "{} ({} bytes) -> {} ({} bytes)",
        input.display(),
        data.len(),
        output.display(),
        rebuilt.len()
    );
    Ok(())
}
