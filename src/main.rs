//! graph2tab CLI - provenance graph flows and path tables

use std::fs;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde_json::json;

use graph2tab::{
    EventLog, FixSuggestion, FlowInitialiser, Graph2TabError, GraphDocument, TableBuilder,
};

#[derive(Parser)]
#[command(name = "graph2tab")]
#[command(about = "Provenance DAG to path table conversion")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a graph file (parse and build only)
    Validate {
        /// Path to the graph YAML file
        file: String,
    },

    /// Initialise the flow and print every edge's flow
    Flows {
        /// Path to the graph YAML file
        file: String,

        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Also print the initialisation event log as JSON
        #[arg(long)]
        events: bool,
    },

    /// Decompose the flow into rows and print them as TSV
    Table {
        /// Path to the graph YAML file
        file: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { file } => validate_graph(&file),
        Commands::Flows {
            file,
            format,
            events,
        } => print_flows(&file, format, events),
        Commands::Table { file } => print_table(&file),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn load(file: &str) -> Result<GraphDocument, Graph2TabError> {
    let yaml = fs::read_to_string(file)?;
    GraphDocument::from_yaml(&yaml)
}

fn validate_graph(file: &str) -> Result<(), Graph2TabError> {
    let document = load(file)?;
    let built = document.build()?;

    println!("{} Graph '{}' is valid", "✓".green(), file);
    println!("  Nodes: {}", built.graph.len());
    println!("  Edges: {}", built.graph.edge_count());
    println!("  Frontier: {}", built.frontier.len());

    Ok(())
}

fn print_flows(file: &str, format: Format, events: bool) -> Result<(), Graph2TabError> {
    let built = load(file)?.build()?;
    let log = EventLog::new();

    let mut initialiser = FlowInitialiser::new(&built.graph, built.frontier.iter().copied())
        .with_limits(built.limits);
    if events {
        initialiser = initialiser.with_diagnostics(Arc::new(log.clone()));
    }

    let graph = initialiser.graph();
    let start_nodes: Vec<String> = initialiser
        .start_nodes()?
        .iter()
        .map(|&id| graph.key(id).to_string())
        .collect();
    let end_nodes: Vec<String> = initialiser
        .end_nodes()?
        .iter()
        .map(|&id| graph.key(id).to_string())
        .collect();
    let stats = initialiser.stats();
    let edges = initialiser.flow_manager()?.edge_flows();

    match format {
        Format::Json => {
            let mut report = json!({
                "start_nodes": start_nodes,
                "end_nodes": end_nodes,
                "edges": edges,
                "visits": stats.visits,
            });
            if events {
                report["events"] = log.to_json()?;
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Format::Text => {
            println!("{} {}", "Start nodes:".cyan().bold(), start_nodes.join(", "));
            println!("{} {}", "End nodes:".cyan().bold(), end_nodes.join(", "));
            println!("{}", "Flows:".cyan().bold());
            for edge in &edges {
                println!("  {} -> {}: {}", edge.from, edge.to, edge.flow);
            }
            if events {
                println!("{}", "Events:".cyan().bold());
                println!("{}", serde_json::to_string_pretty(&log.to_json()?)?);
            }
        }
    }

    Ok(())
}

fn print_table(file: &str) -> Result<(), Graph2TabError> {
    let built = load(file)?.build()?;
    let mut initialiser = FlowInitialiser::new(&built.graph, built.frontier.iter().copied())
        .with_limits(built.limits);

    let table = TableBuilder::build(&mut initialiser)?;
    print!("{}", table.to_tsv());

    Ok(())
}
