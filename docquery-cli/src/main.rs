//! Command line entry point.
//!
//! Usage:
//!   docquery build [--corpus DIR] [--out BASE]
//!   docquery ask [--document URL] QUESTION...

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use docquery_core::{KnowledgeSettings, Settings};
use docquery_knowledge::{BaseKnowledgeBuilder, StorePaths, embedding_provider_from_settings};

#[derive(Parser)]
#[command(name = "docquery", version, about = "Question answering over policy documents")]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the base knowledge index from a directory of PDFs
    Build {
        /// Directory holding the corpus PDFs
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Base path of the written index, e.g. data/vector_store/base_knowledge
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Answer questions against a document URL or the base knowledge
    Ask {
        /// URL of the PDF to query; the base knowledge is used when omitted
        #[arg(long)]
        document: Option<String>,

        /// Questions to answer, in order
        #[arg(required = true)]
        questions: Vec<String>,
    },
}

#[derive(Serialize)]
struct AskOutput {
    answers: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    docquery_core::load_dotenv();
    let settings = Settings::load()?;

    // Logs go to stderr so `ask` output stays machine readable.
    let level = if cli.verbose {
        "debug"
    } else {
        settings.logging.level.as_str()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Build { corpus, out } => run_build(&settings, corpus, out).await,
        Command::Ask {
            document,
            questions,
        } => run_ask(settings, document, questions).await,
    }
}

async fn run_build(
    settings: &Settings,
    corpus: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let knowledge = KnowledgeSettings::from(&settings.knowledge);
    let corpus = corpus.unwrap_or_else(|| knowledge.corpus_dir.clone());
    let paths = match out {
        Some(base) => store_paths_for(&base),
        None => StorePaths::from_settings(&knowledge),
    };

    let provider = embedding_provider_from_settings(&knowledge)?;
    let report = BaseKnowledgeBuilder::new(&knowledge, provider)
        .build(&corpus, &paths)
        .await?;

    info!(
        "Indexed {} of {} files ({} skipped) into {} chunks",
        report.files_indexed, report.files_seen, report.files_skipped, report.chunks
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_ask(
    settings: Settings,
    document: Option<String>,
    questions: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let secrets = docquery_core::Secrets::from_env()?;
    let config = docquery_core::Config::from_parts(secrets, settings)?;
    let orchestrator = docquery_gateway::build_orchestrator(&config).await?;

    let answers = orchestrator
        .process(document.as_deref(), &questions)
        .await
        .map_err(|err| format!("{:?}: {err}", err.kind()))?;

    println!("{}", serde_json::to_string_pretty(&AskOutput { answers })?);
    Ok(())
}

/// `--out data/store/base` names the index base; the cache sits beside it.
fn store_paths_for(base: &std::path::Path) -> StorePaths {
    let store_dir = base.parent().map(PathBuf::from).unwrap_or_default();
    let base_name = base
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "base_knowledge".to_string());
    StorePaths::new(&store_dir, &base_name)
}
