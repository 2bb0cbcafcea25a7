use anyhow::Result;
use clap::{Parser, Subcommand};
use morphcore::{BlockSpec, Chain, GeoValue, RunEvent};
use morphruntime::{BlockRegistry, ChainExecutor, MorphRuntime, RuntimeConfig};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "morph")]
#[command(about = "Mesh manipulation pipeline CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a chain file
    Run {
        /// Path to chain JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a chain file without executing it
    Validate {
        /// Path to chain JSON file
        file: PathBuf,
    },

    /// List available block types
    Blocks,

    /// Create a new example chain
    Init {
        /// Output file path
        #[arg(short, long, default_value = "chain.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file, verbose } => {
            let level = if verbose {
                tracing::Level::DEBUG
            } else {
                tracing::Level::INFO
            };
            tracing_subscriber::fmt().with_max_level(level).init();

            run_chain(file).await?;
        }

        Commands::Validate { file } => {
            validate_chain(file)?;
        }

        Commands::Blocks => {
            list_blocks()?;
        }

        Commands::Init { output } => {
            create_example_chain(output)?;
        }
    }

    Ok(())
}

fn standard_registry() -> Result<BlockRegistry> {
    let mut registry = BlockRegistry::new();
    morphblocks::register_all(&mut registry)?;
    Ok(registry)
}

fn summarize(value: &GeoValue) -> String {
    match value {
        GeoValue::Mesh(m) => format!(
            "mesh ({} vertices, {} triangles)",
            m.vertex_count(),
            m.triangle_count()
        ),
        GeoValue::Coords(c) => format!("{} points", c.len()),
        GeoValue::CoordField(f) => format!("displacement field ({} vertices)", f.len()),
        GeoValue::Scalars(s) => format!("{} scalars", s.len()),
        GeoValue::ScalarField(f) => format!("scalar field ({} vertices)", f.len()),
        GeoValue::Text(s) => s.clone(),
        other => format!("{:?}", other),
    }
}

async fn run_chain(file: PathBuf) -> Result<()> {
    println!("🚀 Loading chain from: {}", file.display());

    let chain_json = std::fs::read_to_string(&file)?;
    let chain: Chain = serde_json::from_str(&chain_json)?;

    println!("📋 Chain: {}", chain.name);
    println!("   Blocks: {}", chain.blocks.len());
    println!("   Links: {}", chain.links.len());
    println!();

    let runtime = MorphRuntime::with_registry(
        Arc::new(standard_registry()?),
        RuntimeConfig::default(),
    );

    // Live event printing while the chain runs
    let mut events = runtime.subscribe_events();
    let names: std::collections::HashMap<_, _> = chain
        .blocks
        .iter()
        .map(|b| (b.id, b.label().to_string()))
        .collect();
    let event_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                RunEvent::ChainStarted { .. } => {
                    println!("▶️  Chain started");
                }
                RunEvent::BlockStarted {
                    block_id,
                    block_type,
                    ..
                } => {
                    let label = names.get(&block_id).cloned().unwrap_or_default();
                    println!("  ⚡ Starting block: {} ({})", label, block_type);
                }
                RunEvent::BlockCompleted {
                    block_id,
                    ports,
                    duration_ms,
                    ..
                } => {
                    let label = names.get(&block_id).cloned().unwrap_or_default();
                    println!(
                        "  ✅ Block {} completed in {}ms (published: {})",
                        label,
                        duration_ms,
                        ports.join(", ")
                    );
                }
                RunEvent::BlockFailed {
                    block_id, error, ..
                } => {
                    let label = names.get(&block_id).cloned().unwrap_or_default();
                    println!("  ❌ Block {} failed: {}", label, error);
                }
                RunEvent::BlockSkipped { block_id, .. } => {
                    let label = names.get(&block_id).cloned().unwrap_or_default();
                    println!("  ⏭️  Block {} skipped", label);
                }
                RunEvent::BlockMessage {
                    block_id, message, ..
                } => {
                    let label = names.get(&block_id).cloned().unwrap_or_default();
                    match message {
                        morphcore::BlockMessage::Info { message } => {
                            println!("     ℹ️  [{}] {}", label, message);
                        }
                        morphcore::BlockMessage::Warning { message } => {
                            println!("     ⚠️  [{}] {}", label, message);
                        }
                        morphcore::BlockMessage::Progress { percent, message } => {
                            if let Some(msg) = message {
                                println!("     📊 [{}] {}% - {}", label, percent, msg);
                            } else {
                                println!("     📊 [{}] {}%", label, percent);
                            }
                        }
                    }
                }
                RunEvent::ChainCompleted {
                    success,
                    duration_ms,
                    ..
                } => {
                    if success {
                        println!("✨ Chain completed successfully in {}ms", duration_ms);
                    } else {
                        println!("💥 Chain aborted after {}ms", duration_ms);
                    }
                }
            }
        }
    });

    let report = runtime.execute(&chain).await;

    // Let pending events drain before printing the summary
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    event_task.abort();

    println!();
    println!("📊 Run Summary:");
    println!("   Run ID: {}", report.run_id);
    println!("   Outcome: {:?}", report.outcome);
    if let Some(err) = &report.error {
        println!("   Error: {}", err);
    }
    for spec in &chain.blocks {
        println!("   {:<24} {:?}", spec.label(), report.status(spec.id));
    }

    if !report.outputs.is_empty() {
        println!();
        println!("📤 Outputs:");
        for spec in &chain.blocks {
            if let Some(outputs) = report.outputs.get(&spec.id) {
                if outputs.is_empty() {
                    continue;
                }
                println!("   Block {}:", spec.label());
                for (port, container) in outputs {
                    println!("     {}: {}", port, summarize(container.value()));
                }
            }
        }
    }

    if report.is_completed() {
        Ok(())
    } else {
        Err(anyhow::anyhow!("chain run aborted"))
    }
}

fn validate_chain(file: PathBuf) -> Result<()> {
    println!("🔍 Validating chain: {}", file.display());

    let chain_json = std::fs::read_to_string(&file)?;
    let chain: Chain = serde_json::from_str(&chain_json)?;

    let registry = standard_registry()?;
    ChainExecutor::default().check(&chain, &registry)?;

    println!("✅ Chain is valid:");
    println!("   Name: {}", chain.name);
    println!("   Blocks: {}", chain.blocks.len());
    println!("   Links: {}", chain.links.len());

    Ok(())
}

fn list_blocks() -> Result<()> {
    println!("📦 Available Block Types:");
    println!();

    let registry = standard_registry()?;
    for block_type in registry.list_block_types() {
        if let Some(metadata) = registry.get_metadata(&block_type) {
            println!("  • {} ({})", block_type, metadata.category);
            println!("    {}", metadata.description);
            for port in &metadata.inputs {
                let req = if port.mandatory { "required" } else { "optional" };
                println!("      in  {} : {} ({})", port.name, port.tag, req);
            }
            for port in &metadata.outputs {
                println!("      out {} : {}", port.name, port.tag);
            }
        } else {
            println!("  • {}", block_type);
        }
    }
    Ok(())
}

fn create_example_chain(output: PathBuf) -> Result<()> {
    let mut chain = Chain::new("Example Translation Chain");
    chain.description =
        Some("Reads a mesh, shifts it along z and writes the deformed surface".to_string());

    let source = BlockSpec::new("source.mesh")
        .with_name("Load Surface")
        .with_config("file", "input.obj");
    let translate = BlockSpec::new("manip.translate")
        .with_name("Shift Up")
        .with_config("direction", "0 0 1")
        .with_config("magnitude", "0.5");
    let apply = BlockSpec::new("manip.apply").with_name("Apply Displacements");
    let writer = BlockSpec::new("sink.obj")
        .with_name("Write Surface")
        .with_config("file", "deformed.obj");

    let source_id = chain.add_block(source);
    let translate_id = chain.add_block(translate);
    let apply_id = chain.add_block(apply);
    let writer_id = chain.add_block(writer);

    // The source geometry fans out to the manipulator and the applier.
    chain.connect(source_id, "geometry", translate_id, "geometry")?;
    chain.connect(source_id, "geometry", apply_id, "geometry")?;
    chain.connect(translate_id, "displacements", apply_id, "displacements")?;
    chain.connect(apply_id, "geometry", writer_id, "geometry")?;

    let json = serde_json::to_string_pretty(&chain)?;
    std::fs::write(&output, json)?;

    println!("✨ Created example chain: {}", output.display());
    println!();
    println!("Run it with:");
    println!("  morph run --file {}", output.display());

    Ok(())
}
