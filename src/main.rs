//! ragbot - conversational RAG assistant
//!
//! Main entry point: load configuration, ingest documents, then answer
//! one question or run the interactive loop.

use std::sync::Arc;

use anyhow::Context;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use ragbot::agent::ResearchAgent;
use ragbot::cli::Cli;
use ragbot::core::Config;
use ragbot::history::ConversationStore;
use ragbot::llm::build_provider;
use ragbot::mcp::RemoteDocs;
use ragbot::rag::{ingest_folder, RagEngine, RetrievalIndex, SqliteIndex};

/// Question-answering backend picked by the `--agent` flag.
enum Answerer {
    Engine(RagEngine),
    Agent(ResearchAgent),
}

impl Answerer {
    async fn answer(
        &self,
        index: &dyn RetrievalIndex,
        question: &str,
        session_id: &str,
    ) -> Result<(String, Vec<String>), ragbot::RagError> {
        match self {
            Answerer::Engine(engine) => {
                let answer = engine.answer(index, question, session_id).await?;
                Ok((answer.text, answer.sources))
            }
            Answerer::Agent(agent) => {
                let answer = agent.run(index, question, session_id).await?;
                Ok((answer.text, answer.sources))
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(docs) = &cli.docs {
        config.docs_path = docs.clone();
    }

    ragbot::logging::init(&config.log_dir);
    tracing::info!("Using provider {} with model {}", config.provider, config.model);

    let provider = build_provider(&config).context("Failed to build the LLM provider")?;
    let index = SqliteIndex::with_path(config.db_path.clone(), provider.clone())
        .await
        .context("Failed to open the vector index")?;
    let history = Arc::new(ConversationStore::new());

    if !cli.skip_ingest {
        println!("Processing documents from {}...", config.docs_path.display());
        let report = ingest_folder(&index, &config.docs_path, config.chunk_size)
            .await
            .context("Document ingestion failed")?;
        println!(
            "Ingested {} files into {} chunks ({} skipped).",
            report.files_ingested, report.chunks_stored, report.files_skipped
        );
    }

    let answerer = if cli.agent {
        let remote_docs = connect_remote_docs(&config).await;
        Answerer::Agent(ResearchAgent::new(
            &config,
            provider.clone(),
            history.clone(),
            remote_docs,
        ))
    } else {
        Answerer::Engine(RagEngine::with_limits(
            history.clone(),
            provider.clone(),
            config.top_k,
            config.history_window,
        ))
    };

    let session_id = history.create_session().await;

    if let Some(question) = &cli.query {
        let (text, sources) = answerer
            .answer(&index, question, &session_id)
            .await
            .context("Failed to answer the question")?;
        print_answer(&text, &sources);
        return Ok(());
    }

    if cli.interactive {
        run_interactive(&answerer, &index, &session_id).await?;
    }

    Ok(())
}

/// Connects to the configured remote documentation server, if any.
/// Failures are logged and the agent runs without the tool.
async fn connect_remote_docs(config: &Config) -> Option<RemoteDocs> {
    let remote_config = config.remote_docs.as_ref()?;
    match RemoteDocs::connect(remote_config).await {
        Ok(remote) => {
            tracing::info!("Remote docs tools available: {:?}", remote.tool_names());
            Some(remote)
        }
        Err(e) => {
            tracing::warn!("Remote docs server unavailable, continuing without it: {e}");
            None
        }
    }
}

async fn run_interactive(
    answerer: &Answerer,
    index: &dyn RetrievalIndex,
    session_id: &str,
) -> anyhow::Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("\nAsk about your documents. Type 'exit' to quit.");

    loop {
        match rl.readline("\nEnter your question: ") {
            Ok(line) => {
                let question = line.trim();
                if question.is_empty() {
                    continue;
                }
                if question.eq_ignore_ascii_case("exit") {
                    break;
                }
                let _ = rl.add_history_entry(question);
                match answerer.answer(index, question, session_id).await {
                    Ok((text, sources)) => print_answer(&text, &sources),
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                break;
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn print_answer(text: &str, sources: &[String]) {
    println!("\nResponse:\n{text}");
    if !sources.is_empty() {
        println!("\nSources:");
        for source in sources {
            println!("  - {source}");
        }
    }
}
