// crates/scrapecli/src/main.rs

use anyhow::Result;
use clap::{Parser, Subcommand};
use scrapecore::{ExecutionEvent, GraphSpec, NodeEntry, NodeKind, State};
use scraperuntime::{Runtime, RuntimeConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "scrapeflow")]
#[command(about = "Scrape graph runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a graph specification file
    Run {
        /// Path to graph JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Initial state as a JSON object
        #[arg(short, long)]
        input: Option<String>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Print execution telemetry while running (overrides SCRAPEFLOW_TELEMETRY_ENABLED)
        #[arg(long)]
        telemetry: Option<bool>,
    },

    /// Validate a graph specification file
    Validate {
        /// Path to graph JSON file
        file: PathBuf,
    },

    /// List available node types
    Nodes,

    /// Create a new example graph specification
    Init {
        /// Output file path
        #[arg(short, long, default_value = "graph.json")]
        output: PathBuf,
    },

    /// Print a graph specification as Graphviz DOT
    Dot {
        /// Path to graph JSON file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            input,
            verbose,
            telemetry,
        } => {
            // Initialize logging
            if verbose {
                tracing_subscriber::fmt()
                    .with_max_level(tracing::Level::DEBUG)
                    .init();
            } else {
                tracing_subscriber::fmt()
                    .with_max_level(tracing::Level::INFO)
                    .init();
            }

            run_graph(file, input, telemetry).await?;
        }

        Commands::Validate { file } => {
            validate_graph(file)?;
        }

        Commands::Nodes => {
            list_nodes();
        }

        Commands::Init { output } => {
            create_example_graph(output)?;
        }

        Commands::Dot { file } => {
            let runtime = default_runtime(RuntimeConfig::default());
            let graph = runtime.build_graph(&load_spec(&file)?)?;
            println!("{}", graph.to_dot());
        }
    }

    Ok(())
}

fn load_spec(file: &Path) -> Result<GraphSpec> {
    let json = std::fs::read_to_string(file)?;
    Ok(GraphSpec::from_json_str(&json)?)
}

fn default_runtime(config: RuntimeConfig) -> Runtime {
    Runtime::with_registry(Arc::new(scrapenodes::default_registry()), config)
}

async fn run_graph(file: PathBuf, input: Option<String>, telemetry: Option<bool>) -> Result<()> {
    println!("🚀 Loading graph from: {}", file.display());

    let spec = load_spec(&file)?;

    println!("📋 Entry point: {}", spec.entry_point);
    println!("   Nodes: {}", spec.nodes.len());
    println!("   Edges: {}", spec.edges.len());
    println!();

    let state = match input {
        Some(input_str) => {
            let json: serde_json::Value = serde_json::from_str(&input_str)?;
            State::from_json_object(json)
                .ok_or_else(|| anyhow::anyhow!("Input must be a JSON object"))?
        }
        None => State::new(),
    };

    let mut config = RuntimeConfig::from_env();
    if let Some(enabled) = telemetry {
        config.telemetry_enabled = enabled;
    }
    let runtime = default_runtime(config);
    let graph = runtime.build_graph(&spec)?;

    // Subscribe to events for real-time output
    let mut events = runtime.subscribe_events();

    let event_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ExecutionEvent::RunStarted { entry_point, .. } => {
                    println!("▶️  Run started at {}", entry_point);
                }
                ExecutionEvent::NodeStarted {
                    node_name,
                    node_type,
                    ..
                } => {
                    println!("  ⚡ Starting node: {} ({})", node_name, node_type);
                }
                ExecutionEvent::NodeCompleted { record, .. } => {
                    println!(
                        "  ✅ Node {} completed in {:.3}s",
                        record.node_name, record.exec_time
                    );
                }
                ExecutionEvent::NodeFailed {
                    node_name, error, ..
                } => {
                    println!("  ❌ Node {} failed: {}", node_name, error);
                }
                ExecutionEvent::RunCompleted {
                    success, exec_time, ..
                } => {
                    if success {
                        println!("✨ Run completed successfully in {:.3}s", exec_time);
                    } else {
                        println!("💥 Run failed after {:.3}s", exec_time);
                    }
                    break;
                }
            }
        }
    });

    let outcome = runtime.execute(&graph, state).await;

    // Let the listener drain before printing the summary
    if runtime.event_bus().is_enabled() {
        let _ = tokio::time::timeout(tokio::time::Duration::from_millis(500), event_task).await;
    } else {
        event_task.abort();
    }

    let result = match outcome {
        Ok(result) => result,
        Err(error) => {
            if let Some(trace) = error.trace() {
                println!();
                println!("📊 Trace up to failure:");
                print!("{}", trace.to_table());
            }
            return Err(error.into());
        }
    };

    println!();
    println!("📊 Execution Summary:");
    println!("   Execution ID: {}", result.execution_id);
    print!("{}", result.trace.to_table());

    println!();
    println!("📤 Final state:");
    println!("{}", serde_json::to_string_pretty(&result.state.to_json())?);

    Ok(())
}

fn validate_graph(file: PathBuf) -> Result<()> {
    println!("🔍 Validating graph: {}", file.display());

    let spec = load_spec(&file)?;
    spec.validate()?;

    // Instantiating catches unknown steps and bad node config
    let runtime = default_runtime(RuntimeConfig::default());
    let graph = runtime.build_graph(&spec)?;

    println!("✅ Graph is valid:");
    println!("   Entry point: {}", graph.entry_point());
    println!("   Nodes: {}", graph.len());
    for node in graph.nodes() {
        println!("     • {} [{}] input: {}", node.name(), node.kind(), node.spec().input);
    }

    Ok(())
}

fn list_nodes() {
    println!("📦 Available Node Types:");
    println!();

    let registry = scrapenodes::default_registry();

    for node_type in registry.list_node_types() {
        let kind = registry.get_kind(&node_type).unwrap_or(NodeKind::Standard);
        if let Some(metadata) = registry.get_metadata(&node_type) {
            println!("  • {} ({}, {})", node_type, metadata.category, kind);
            println!("    {}", metadata.description);
        } else {
            println!("  • {}", node_type);
        }
    }
}

fn create_example_graph(output: PathBuf) -> Result<()> {
    let mut spec = GraphSpec::new("fetch");

    spec.add_node(
        NodeEntry::new("fetch", NodeKind::Standard, "url | local_dir")
            .with_output(["doc"])
            .with_arg("timeout_secs", 30),
    )
    .add_node(
        NodeEntry::new("check_doc", NodeKind::Conditional, "doc")
            .with_step("conditional.key_present")
            .with_arg("key_name", "doc"),
    )
    .add_node(
        NodeEntry::new("parse", NodeKind::Standard, "doc")
            .with_output(["parsed_doc"])
            .with_arg("chunk_size", 2048),
    )
    .add_node(
        NodeEntry::new("log", NodeKind::Standard, "parsed_doc | doc | url")
            .with_step("debug.log"),
    );

    spec.connect("fetch", "check_doc")
        .branch("check_doc", "parse", "log")
        .connect("parse", "log");

    std::fs::write(&output, spec.to_json_pretty()?)?;

    println!("✨ Created example graph: {}", output.display());
    println!();
    println!("Run it with:");
    println!(
        "  scrapeflow run --file {} --input '{{\"url\": \"https://example.com\"}}'",
        output.display()
    );

    Ok(())
}
