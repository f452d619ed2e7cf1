// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floorplan CLI - graph ingest, module mining and grouping.
//!
//! # Usage
//!
//! ```bash
//! # Build and store one graph per apartment
//! floorplan ingest floors.json
//!
//! # Mine two-room modules present in at least 3 apartments
//! floorplan mine --min-support 3 --max-width 6 --vertex-count 2
//!
//! # Group stored modules, then count room types of one pattern
//! floorplan group
//! floorplan combos "v 0 bathroom v 1 bedroom e 0 1 1"
//!
//! # Panel/space document of one floor, and back into the graph store
//! floorplan export floors.json --floor 12 --output floor12.json
//! floorplan import floor12.json --graph-id 12_panels
//! ```
//!
//! Store locations come from `--config` or the `FLOORPLAN_*` environment
//! variables. Results are printed as JSON on stdout; logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use floorplan_core::{floors_from_records, load_records, Config, MiningParams};
use floorplan_processing::{Engine, PanelDocument};

#[derive(Parser)]
#[command(name = "floorplan")]
#[command(about = "Floorplan graphs and recurring room modules", long_about = None)]
struct Cli {
    /// JSON configuration file (environment overrides still apply)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, classify and store one graph per apartment
    Ingest {
        /// Dataset (JSON array or JSON lines)
        dataset: PathBuf,
    },

    /// Mine the stored graphs and replace the module store
    Mine {
        #[arg(long, default_value = "3")]
        min_support: usize,

        /// Maximum short side of a module's bounding rectangle
        #[arg(long, default_value = "6.0")]
        max_width: f64,

        /// Maximum shape-irregularity ratio
        #[arg(long, default_value = "0.3")]
        ratio_threshold: f64,

        /// Rooms per module
        #[arg(long, default_value = "2")]
        vertex_count: usize,
    },

    /// Group stored modules by signature
    Group,

    /// Room-type combinations of the stored matches of a pattern
    Combos {
        /// Pattern description, e.g. "v 0 bathroom v 1 bedroom e 0 1 1"
        pattern: String,

        /// Restrict to these graph ids
        #[arg(short, long)]
        gid: Vec<String>,
    },

    /// Write the panel/space document of one floor
    Export {
        dataset: PathBuf,

        #[arg(short, long)]
        floor: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Store the graph of a panel/space document
    Import {
        document: PathBuf,

        #[arg(long)]
        graph_id: String,
    },

    /// List stored graph ids
    Graphs,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_env(|key| std::env::var(key).ok())?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,floorplan=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let engine = Engine::new(load_config(cli.config.as_deref())?)?;

    match cli.command {
        Commands::Ingest { dataset } => {
            let records = load_records(&dataset)?;
            let summary = engine.ingest(&records);
            print_json(&summary)?;
            if summary.stored.is_empty() && !summary.failures.is_empty() {
                bail!("no graph could be stored");
            }
        }
        Commands::Mine {
            min_support,
            max_width,
            ratio_threshold,
            vertex_count,
        } => {
            let report = engine.mine(&MiningParams {
                min_support,
                max_width,
                ratio_threshold,
                vertex_count,
            })?;
            print_json(&report)?;
        }
        Commands::Group => {
            print_json(&engine.group_modules()?)?;
        }
        Commands::Combos { pattern, gid } => {
            let gids = (!gid.is_empty()).then_some(gid.as_slice());
            print_json(&engine.query_combos(&pattern, gids)?)?;
        }
        Commands::Export {
            dataset,
            floor,
            output,
        } => {
            let records = load_records(&dataset)?;
            let Some(floor) = floors_from_records(&records)
                .into_iter()
                .find(|f| f.id == floor)
            else {
                bail!("floor {floor} not found in {}", dataset.display());
            };
            let json = engine.export_floor(&floor).to_json()?;
            match output {
                Some(path) => std::fs::write(&path, json)
                    .with_context(|| format!("writing {}", path.display()))?,
                None => println!("{json}"),
            }
        }
        Commands::Import { document, graph_id } => {
            let text = std::fs::read_to_string(&document)
                .with_context(|| format!("reading {}", document.display()))?;
            let graph = PanelDocument::from_json(&text)?.to_graph()?;
            engine.store_graph(&graph_id, &graph)?;
            tracing::info!(
                graph = %graph_id,
                nodes = graph.node_count(),
                edges = graph.edge_count(),
                "Imported panel document"
            );
        }
        Commands::Graphs => {
            print_json(&engine.list_graph_ids()?)?;
        }
    }
    Ok(())
}
