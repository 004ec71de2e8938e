//! Codeflow CLI
//!
//! # Usage
//!
//! ```bash
//! # Flowchart a file, writing SVG next to it
//! cargo run --bin codeflow -- run --input script.py
//!
//! # Mermaid text only, no rendering service call
//! cargo run --bin codeflow -- run --input script.py --no-render
//! ```
//!
//! Model access is configured through the environment: set
//! `GROQ_API_KEY` or `OPENAI_API_KEY`, optionally `CODEFLOW_MODEL`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use codeflow_core::{
    Degradation, FlowError, HttpModelClient, MermaidInkRenderer, ModelConfig, Pipeline,
    PipelineConfig,
};

#[derive(Parser)]
#[command(name = "codeflow")]
#[command(about = "Turn source code into flowcharts via an LLM", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline over one source file
    Run {
        /// Source file to flowchart
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the rendered SVG (default: input with .svg)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Where to write the mermaid text (default: input with .mmd)
        #[arg(long)]
        mermaid_out: Option<PathBuf>,

        /// Skip the rendering service, emit mermaid text only
        #[arg(long)]
        no_render: bool,

        /// Token budget per chunk
        #[arg(long, default_value = "2800")]
        budget: usize,

        /// Max concurrent model requests
        #[arg(long, default_value = "4")]
        parallelism: usize,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run(Cli::parse()).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), FlowError> {
    let Commands::Run {
        input,
        output,
        mermaid_out,
        no_render,
        budget,
        parallelism,
    } = cli.command;

    let text = std::fs::read_to_string(&input)?;
    let filename = input.file_name().map(|n| n.to_string_lossy().into_owned());

    let config = PipelineConfig::default()
        .with_token_budget(budget)
        .with_parallelism(parallelism)
        .with_render_image(!no_render);

    let client = HttpModelClient::new(ModelConfig::from_env()?)?;
    let mut pipeline = Pipeline::new(Arc::new(client)).with_config(config.clone());
    if !no_render {
        let renderer = MermaidInkRenderer::new(config.render_timeout)
            .map_err(|e| FlowError::config(e.to_string()))?;
        pipeline = pipeline.with_renderer(Arc::new(renderer));
    }

    let outcome = pipeline.run(&text, filename.as_deref()).await?;

    let mermaid_path = mermaid_out.unwrap_or_else(|| input.with_extension("mmd"));
    std::fs::write(&mermaid_path, &outcome.artifact.notation)?;
    println!("mermaid  : {}", mermaid_path.display());

    if let Some(image) = &outcome.artifact.image {
        let svg_path = output.unwrap_or_else(|| input.with_extension("svg"));
        std::fs::write(&svg_path, image)?;
        println!("svg      : {}", svg_path.display());
    } else if outcome.artifact.render_failed {
        println!("svg      : rendering failed, text output only");
    }

    println!(
        "language : {}\nfunctions: {}\nchunks   : {} ({} fragment(s) failed)",
        outcome.language.name(),
        outcome.function_count,
        outcome.chunk_count,
        outcome.failed_fragment_count(),
    );
    for degradation in &outcome.degradations {
        println!("note     : {}", describe(degradation));
    }
    Ok(())
}

fn describe(d: &Degradation) -> String {
    match d {
        Degradation::DetectionAmbiguous { detail } => format!("language ambiguous ({detail})"),
        Degradation::ParsePartial { issue_count } => {
            format!("parsed with {issue_count} syntax issue(s)")
        }
        Degradation::ChunkOversized {
            chunk_index,
            estimated_tokens,
        } => format!("chunk {chunk_index} over budget ({estimated_tokens} tokens), condensed"),
        Degradation::ModelTransientFailure {
            chunk_index,
            attempts,
            reason,
        } => format!("chunk {chunk_index} failed after {attempts} attempt(s): {reason}"),
        Degradation::AssemblyInconsistent { detail } => format!("assembly: {detail}"),
        Degradation::RenderFailure { reason } => format!("render: {reason}"),
    }
}
