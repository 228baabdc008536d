/// AgentBlocks demo runner
///
/// Builds a small workflow (or loads one from a JSON document), compiles it to
/// Python, runs it and prints the generated code, the result and the workflow
/// document.

use agentblocks::{
    runtime::{GraphCompiler, OrderingStrategy, ScriptRunner},
    server::init_tracing,
    workflow::{
        document,
        types::{NodeKind, Position, PrintProperties, VariableProperties, Workflow},
    },
};
use anyhow::Result;
use clap::Parser;
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Parser)]
#[command(name = "agentblocks-demo", about = "Compile and run an AgentBlocks workflow")]
struct Args {
    /// Workflow document to run instead of the built-in demo workflow
    #[arg(long)]
    workflow: Option<PathBuf>,

    /// Write the workflow document here after running
    #[arg(long)]
    save: Option<PathBuf>,

    /// Interpreter binary used to run the generated code
    #[arg(long, default_value = "python3")]
    interpreter: String,

    /// Seconds before the generated program is killed
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: u64,

    /// Node ordering: spatial or dependency
    #[arg(long, default_value = "spatial")]
    ordering: OrderingStrategy,
}

/// The greeting workflow: a variable node above a print node that references it
fn demo_workflow() -> Workflow {
    let mut workflow = Workflow::new("demo-workflow", "Demo Workflow");

    workflow.add_node(
        NodeKind::Variable(VariableProperties {
            name: "greeting".to_string(),
            value: "Hello, AgentBlocks!".to_string(),
        }),
        Position::new(100.0, 100.0),
    );
    workflow.add_node(
        NodeKind::Print(PrintProperties {
            message: "greeting".to_string(),
        }),
        Position::new(100.0, 200.0),
    );

    workflow
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let workflow = match &args.workflow {
        Some(path) => document::load_workflow(path).await?,
        None => demo_workflow(),
    };
    println!("Workflow: {} ({} nodes)", workflow.name, workflow.nodes.len());

    let program = GraphCompiler::new(args.ordering).compile(&workflow)?;
    println!("Generated Python Code:");
    println!("{}", "=".repeat(40));
    print!("{}", program.source);
    println!("{}", "=".repeat(40));

    let runner = ScriptRunner::new(args.interpreter, Duration::from_secs(args.timeout_secs));
    let result = runner.run(&program.source).await;

    println!("Success: {}", result.success);
    if result.success {
        println!("Output: {}", result.output.trim());
    } else {
        println!("Error: {}", result.error.as_deref().unwrap_or_default());
    }

    println!("Workflow JSON:");
    println!("{}", document::to_document(&workflow)?);

    if let Some(path) = &args.save {
        document::save_workflow(path, &workflow).await?;
    }

    Ok(())
}
