//! noteforest CLI tool
//!
//! Command-line interface for managing note and tag hierarchies in a SQLite knowledge base.
//!
//! ## Commands
//!
//! - `init`: Create the database and write a default config file
//! - `add-note`, `add-tag`, `tag-note`: Minimal node management for populating a database
//! - `link`, `move`, `unlink`, `detach`: Hierarchy edits, validated like every other caller's
//! - `tree`, `tag-tree`: Render a partition's forest, as text or JSON
//!
//! Settings come from `--config` (default `noteforest.toml`); `--db` overrides the database path
//! and `RUST_LOG` overrides the configured log filter.

use clap::{Parser, Subcommand};
use noteforest::{
    config::HierarchyConfig,
    db::DbConnection,
    engine::HierarchyEngine,
    forest::AnnotatedNode,
    properties::{Node, NodeId, Partition},
    HierarchyError,
};
use std::{collections::BTreeSet, path::PathBuf};

#[derive(Parser)]
#[command(name = "noteforest")]
#[command(author, version, about = "Manage note and tag hierarchies", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "noteforest.toml")]
    config: PathBuf,

    /// Database file, overriding the configured one
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and write the config file if it does not exist yet
    Init,

    /// Create a note
    AddNote { title: String },

    /// Create a tag
    AddTag { name: String },

    /// Attach a tag to a note
    TagNote { note: NodeId, tag: NodeId },

    /// Place `child` under `parent`
    Link {
        partition: Partition,
        parent: NodeId,
        child: NodeId,

        /// Relation kind for note entries: page, block or subpage
        #[arg(long)]
        kind: Option<String>,
    },

    /// Re-parent `child` under `parent`
    Move {
        partition: Partition,
        child: NodeId,
        parent: NodeId,

        /// Relation kind for note entries: page, block or subpage
        #[arg(long)]
        kind: Option<String>,
    },

    /// Remove the parent entry of `child`, making it a root
    Unlink { partition: Partition, child: NodeId },

    /// Remove every hierarchy entry naming `node`
    Detach { partition: Partition, node: NodeId },

    /// Print the forest of a partition
    Tree {
        partition: Partition,

        /// Only show these nodes and the ancestors connecting them to a root
        #[arg(long = "keep")]
        keep: Vec<NodeId>,

        /// Print JSON instead of an indented outline
        #[arg(long)]
        json: bool,
    },

    /// Print the tag forest with each tag's notes
    TagTree {
        /// Print JSON instead of an indented outline
        #[arg(long)]
        json: bool,
    },
}

fn print_annotated(forest: &[AnnotatedNode<Node>], depth: usize) {
    for tag in forest {
        let notes = tag
            .annotations
            .iter()
            .map(|note| note.label.as_str())
            .collect::<Vec<&str>>();
        if notes.is_empty() {
            println!("{:indent$}- {} [{}]", "", tag.label, tag.id, indent = depth * 2);
        } else {
            println!(
                "{:indent$}- {} [{}]: {}",
                "",
                tag.label,
                tag.id,
                notes.join(", "),
                indent = depth * 2
            );
        }
        print_annotated(&tag.children, depth + 1);
    }
}

async fn run(cli: Cli, mut config: HierarchyConfig) -> Result<(), HierarchyError> {
    if let Some(db) = cli.db {
        config.database = db;
    }
    let db = DbConnection::open(&config.database).await?;
    let engine = HierarchyEngine::with_config(db, &config);

    match cli.command {
        Commands::Init => {
            if !cli.config.exists() {
                config.save(&cli.config)?;
                println!("✓ Config file created: {}", cli.config.display());
            }
            println!("✓ Database ready: {}", config.database.display());
        }
        Commands::AddNote { title } => {
            let id = engine.store().insert_node(Partition::Notes, &title).await?;
            println!("{id}");
        }
        Commands::AddTag { name } => {
            let id = engine.store().insert_node(Partition::Tags, &name).await?;
            println!("{id}");
        }
        Commands::TagNote { note, tag } => {
            engine.store().tag_note(note, tag).await?;
        }
        Commands::Link {
            partition,
            parent,
            child,
            kind,
        } => {
            let id = engine
                .add_edge(partition, parent, child, kind.as_deref())
                .await?;
            println!("✓ {partition} entry {id}: {parent} -> {child}");
        }
        Commands::Move {
            partition,
            child,
            parent,
            kind,
        } => {
            engine
                .update_edge(partition, child, parent, kind.as_deref())
                .await?;
            println!("✓ {child} moved under {parent}");
        }
        Commands::Unlink { partition, child } => {
            engine.delete_edge(partition, child).await?;
            println!("✓ {child} is now a root");
        }
        Commands::Detach { partition, node } => {
            let removed = engine.detach_node(partition, node).await?;
            println!("✓ {removed} {partition} entries removed for {node}");
        }
        Commands::Tree {
            partition,
            keep,
            json,
        } => {
            let forest = if keep.is_empty() {
                engine.forest(partition).await?
            } else {
                let keep = keep.into_iter().collect::<BTreeSet<NodeId>>();
                engine.filtered_forest(partition, &keep).await?
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&forest)?);
            } else {
                for tree in forest.iter() {
                    print!("{tree}");
                }
            }
        }
        Commands::TagTree { json } => {
            let forest = engine.tag_tree().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&forest)?);
            } else {
                print_annotated(&forest, 0);
            }
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = HierarchyConfig::load(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        // Stdout carries command output, including `--json`.
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    if let Err(e) = runtime.block_on(run(cli, config)) {
        if e.is_rejection() {
            eprintln!("Rejected: {e}");
            std::process::exit(1);
        }
        return Err(e.into());
    }
    Ok(())
}
