use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use trellis::{CommentRecord, CommentTree, MergeOutcome, NodeId};

#[derive(Parser, Debug)]
#[command(name = "trellis", about = "Assemble threaded comment trees from flat record batches")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge batches in order and print the threaded outline.
    Show {
        /// JSON files, each holding one array of comment records.
        #[arg(required = true)]
        batches: Vec<PathBuf>,
    },
    /// Merge batches in order and print summary statistics.
    Stats {
        /// JSON files, each holding one array of comment records.
        #[arg(required = true)]
        batches: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Orphaned-branch warnings from the engine surface on stderr unless
    // RUST_LOG says otherwise.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Show { batches } => run_show(batches)?,
        Commands::Stats { batches } => run_stats(batches)?,
    }

    Ok(())
}

fn run_show(batches: Vec<PathBuf>) -> Result<()> {
    let (tree, _) = assemble(&batches)?;
    print_outline(&tree, tree.root(), 0);
    Ok(())
}

fn run_stats(batches: Vec<PathBuf>) -> Result<()> {
    let (tree, outcomes) = assemble(&batches)?;

    for (idx, outcome) in outcomes.iter().enumerate() {
        println!(
            "batch {}\tplaced={}\tgrafted={}\torphaned={}\tduplicates={}",
            idx + 1,
            outcome.placed,
            outcome.grafted_branches,
            outcome.orphaned,
            outcome.skipped_duplicates
        );
    }

    let mut max_depth = 0;
    for node in tree.iter() {
        if let Some(comment) = tree.comment(node) {
            max_depth = max_depth.max(comment.depth);
        }
    }

    println!("comments\t{}", tree.comment_count());
    println!("top-level\t{}", tree.children(tree.root()).len());
    println!("max depth\t{}", max_depth);
    println!("rendered at root\t{}", tree.rendered_replies(tree.root()));
    println!("structure digest\t{}", hex_digest(&tree.structure_digest()));

    for outcome in &outcomes {
        for id in &outcome.orphan_roots {
            println!("orphan root\t{}", id);
        }
    }

    Ok(())
}

fn assemble(batches: &[PathBuf]) -> Result<(CommentTree<Value>, Vec<MergeOutcome>)> {
    let mut tree = CommentTree::new();
    let mut outcomes = Vec::with_capacity(batches.len());

    for path in batches {
        let records = read_batch(path)?;
        outcomes.push(tree.merge_records(records));
    }

    Ok((tree, outcomes))
}

fn read_batch(path: &PathBuf) -> Result<Vec<CommentRecord<Value>>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read batch file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("invalid comment record batch in {}", path.display()))
}

fn print_outline(tree: &CommentTree<Value>, node: NodeId, indent: usize) {
    for &child in tree.children(node) {
        if let Some(comment) = tree.comment(child) {
            println!(
                "{}{}\tdepth={}\treplies={}\trendered={}{}",
                "  ".repeat(indent),
                comment.id,
                comment.depth,
                comment.no_replies,
                tree.rendered_replies(child),
                if tree.is_collapsed(child) { "\t[collapsed]" } else { "" }
            );
        }
        print_outline(tree, child, indent + 1);
    }
}

fn hex_digest(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
