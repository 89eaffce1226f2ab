//! hybridrag CLI - hybrid retrieval and cited answer generation
//!
//! This binary provides the command-line interface for the hybridrag engine.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use hybridrag::render_answer;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hybridrag_core::config::Config;
use hybridrag_pipeline::{AnswerRequest, RagPipeline};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "hybridrag")]
#[command(about = "Hybrid vector and graph retrieval with cited answers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question from a user's documents
    Ask {
        /// The question to answer
        query: String,

        /// User whose documents are searched
        #[arg(short, long)]
        user: String,

        /// Number of reranked chunks handed to generation
        #[arg(long)]
        top_k: Option<usize>,

        /// Print the full response, including chunk debugging data, as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate and print the effective configuration (secrets redacted)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    match cli.command {
        Some(Commands::Ask {
            query,
            user,
            top_k,
            json,
        }) => ask(cli.config.as_deref(), query, user, top_k, json).await,
        Some(Commands::Config) => show_config(cli.config.as_deref()),
        None => {
            println!("Run 'hybridrag ask <question> --user <id>', or --help for more options");
            Ok(())
        }
    }
}

/// Initialize logging system
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };

    let filter = [
        "hybridrag",
        "hybridrag_core",
        "hybridrag_embeddings",
        "hybridrag_storage",
        "hybridrag_reranking",
        "hybridrag_pipeline",
    ]
    .iter()
    .map(|target| format!("{target}={level}"))
    .collect::<Vec<_>>()
    .join(",");

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Answer one question and print the result
async fn ask(
    config_path: Option<&Path>,
    query: String,
    user: String,
    top_k: Option<usize>,
    json: bool,
) -> Result<()> {
    let config = Config::load(config_path).context("Failed to load configuration")?;

    let pipeline = RagPipeline::from_config(&config)
        .await
        .context("Failed to initialize answering pipeline")?;

    let mut request = AnswerRequest::new(query, user);
    if let Some(top_k) = top_k {
        request = request.with_top_k(top_k);
    }

    let response = pipeline.answer(request).await?;
    info!(
        "Answer ready ({} citations, {}ms)",
        response.citations.len(),
        response.metadata.query_time_ms
    );

    println!("{}", render_answer(&response, json)?);
    Ok(())
}

/// Print the effective configuration after file and environment layering
fn show_config(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path).context("Failed to load configuration")?;
    println!("{config:#?}");
    Ok(())
}
