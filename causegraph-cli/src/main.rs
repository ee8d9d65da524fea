// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Causegraph CLI
//!
//! Command-line front end for clustering causal triples.

use anyhow::{Context, Result};
use causegraph_core::{
    CausalClusterer, EngineConfig, Graph, GraphExport, IngestOutcome, RawTriple,
    Rejection, RelationIngestor,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "causegraph")]
#[command(about = "Causegraph - Causal Concept Clustering", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "CAUSEGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose mode
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster triples and print the community report
    Cluster {
        #[command(flatten)]
        input: InputArgs,

        /// Override the Louvain resolution
        #[arg(long)]
        resolution: Option<f64>,
    },

    /// Validate and merge triples, print canonical edges and rejections
    Ingest {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Print the concept graph built from the triples
    Graph {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Input JSON file
    input: PathBuf,

    /// Input format
    #[arg(long, value_enum, default_value = "triples")]
    format: InputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    /// Array of triples, or array of triple batches
    Triples,
    /// Graph database export with nodes and relationships
    Export,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TripleFile {
    Batches(Vec<Vec<RawTriple>>),
    Flat(Vec<RawTriple>),
}

/// Parsed command input
#[derive(Debug)]
enum Input {
    Triples(Vec<RawTriple>),
    Batches(Vec<Vec<RawTriple>>),
    Export {
        triples: Vec<RawTriple>,
        concepts: Vec<String>,
    },
}

impl Input {
    fn load(path: &Path, format: InputFormat) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {:?}", path))?;
        Self::parse(&content, format).with_context(|| format!("Failed to parse {:?}", path))
    }

    fn parse(content: &str, format: InputFormat) -> Result<Self> {
        match format {
            InputFormat::Triples => {
                let file: TripleFile = serde_json::from_str(content)?;
                Ok(match file {
                    TripleFile::Batches(batches) => Input::Batches(batches),
                    TripleFile::Flat(triples) => Input::Triples(triples),
                })
            }
            InputFormat::Export => {
                let export: GraphExport = content.parse()?;
                let loaded = export.to_triples();
                if loaded.skipped > 0 {
                    warn!(
                        skipped = loaded.skipped,
                        "Skipped relationships with undeclared endpoints"
                    );
                }
                Ok(Input::Export {
                    triples: loaded.triples,
                    concepts: export.concepts(),
                })
            }
        }
    }

    fn ingest(&self, ingestor: &RelationIngestor) -> IngestOutcome {
        match self {
            Input::Triples(triples) | Input::Export { triples, .. } => ingestor.ingest(triples),
            Input::Batches(batches) => ingestor.ingest_batches(batches),
        }
    }

    fn concepts(&self) -> &[String] {
        match self {
            Input::Export { concepts, .. } => concepts,
            _ => &[],
        }
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries the JSON result
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}

fn print_rejections(rejected: &[Rejection]) {
    if rejected.is_empty() {
        return;
    }
    warn!(count = rejected.len(), "Skipped invalid triples");
    for rejection in rejected {
        eprintln!(
            "rejected batch {} triple {}{}: {}",
            rejection.batch,
            rejection.index,
            rejection
                .source_id
                .as_deref()
                .map(|id| format!(" ({})", id))
                .unwrap_or_default(),
            rejection.reason
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let mut config = EngineConfig::load(cli.config.clone()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Cluster { input, resolution } => {
            if let Some(resolution) = resolution {
                config.detection.resolution = resolution;
                config.validate().context("Invalid --resolution")?;
            }
            let data = Input::load(&input.input, input.format)?;
            let clusterer = CausalClusterer::new(config);

            let run = match &data {
                Input::Triples(triples) => clusterer.run(triples),
                Input::Batches(batches) => clusterer.run_batches(batches),
                Input::Export { triples, concepts } => clusterer.run_with_concepts(triples, concepts),
            }
            .context("Clustering failed")?;

            print_rejections(&run.rejected);
            if !run.report.converged {
                warn!("Pass limit reached before the partition stabilized");
            }
            info!(
                communities = run.report.community_count(),
                modularity = run.report.modularity,
                "Clustering complete"
            );
            print_json(&run.report, input.pretty)?;
        }

        Commands::Ingest { input } => {
            let data = Input::load(&input.input, input.format)?;
            let outcome = data.ingest(&RelationIngestor::with_config(config.ingest));
            print_rejections(&outcome.rejected);
            print_json(&outcome, input.pretty)?;
        }

        Commands::Graph { input } => {
            let data = Input::load(&input.input, input.format)?;
            let outcome = data.ingest(&RelationIngestor::with_config(config.ingest));
            print_rejections(&outcome.rejected);

            let graph = Graph::from_ingest(&outcome, data.concepts())
                .context("Failed to build concept graph")?;
            print_json(&graph.snapshot(), input.pretty)?;
        }
    }

    Ok(())
}
