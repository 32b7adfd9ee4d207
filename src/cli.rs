//! Command-line interface definition for ragbot.
//!
//! Flat flag set parsed with clap's derive API: pick a document folder,
//! ask one question or open the interactive loop, optionally through
//! the research agent.

use clap::Parser;
use std::path::PathBuf;

/// ragbot - conversational RAG assistant
///
/// Indexes a folder of documents into a local vector store and answers
/// questions grounded in them, with per-session conversation memory.
#[derive(Parser, Debug, Clone)]
#[command(name = "ragbot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Folder of documents to ingest (overrides the configured path)
    #[arg(short, long)]
    pub docs: Option<PathBuf>,

    /// Ask a single question and exit
    #[arg(short, long)]
    pub query: Option<String>,

    /// Open an interactive question loop
    #[arg(short, long)]
    pub interactive: bool,

    /// Route questions through the research agent instead of plain RAG
    #[arg(short, long)]
    pub agent: bool,

    /// Skip document ingestion at startup
    #[arg(long)]
    pub skip_ingest: bool,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
