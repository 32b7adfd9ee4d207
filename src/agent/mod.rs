//! Research agent that routes a question to one tool before answering.
//!
//! The agent asks the model to pick a tool as a JSON object, runs that
//! tool once, then synthesizes a grounded reply. Routing failures fall
//! back to the document index so a malformed tool choice never loses
//! the question.

use std::sync::Arc;

use serde_json::Value;

use crate::core::{Config, RagError};
use crate::history::{ConversationStore, Role};
use crate::llm::LlmProvider;
use crate::mcp::RemoteDocs;
use crate::rag::{RagEngine, RetrievalIndex};
use crate::search::{format_results, web_search};

/// Tool the router selected for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolRoute {
    /// Retrieve from the local document index.
    Rag,
    /// Search the public web.
    WebSearch,
    /// Fetch from the remote documentation server.
    RemoteDocs,
    /// Answer from the model alone.
    Direct,
}

impl ToolRoute {
    /// Maps a tool name from the router's JSON reply onto a route.
    pub fn parse(name: &str) -> Option<ToolRoute> {
        match name.trim().to_lowercase().as_str() {
            "rag" | "documents" | "document_index" => Some(ToolRoute::Rag),
            "web_search" | "web" | "search" => Some(ToolRoute::WebSearch),
            "remote_docs" | "remote" => Some(ToolRoute::RemoteDocs),
            "direct" | "none" => Some(ToolRoute::Direct),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolRoute::Rag => "rag",
            ToolRoute::WebSearch => "web_search",
            ToolRoute::RemoteDocs => "remote_docs",
            ToolRoute::Direct => "direct",
        }
    }
}

impl std::fmt::Display for ToolRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Final reply from one agent turn.
#[derive(Debug, Clone)]
pub struct AgentAnswer {
    pub text: String,
    pub sources: Vec<String>,
    pub route: ToolRoute,
}

pub struct ResearchAgent {
    config: Config,
    llm: Arc<dyn LlmProvider>,
    history: Arc<ConversationStore>,
    engine: RagEngine,
    remote_docs: Option<RemoteDocs>,
}

impl ResearchAgent {
    pub fn new(
        config: &Config,
        llm: Arc<dyn LlmProvider>,
        history: Arc<ConversationStore>,
        remote_docs: Option<RemoteDocs>,
    ) -> Self {
        let engine = RagEngine::with_limits(
            history.clone(),
            llm.clone(),
            config.top_k,
            config.history_window,
        );
        Self {
            config: config.clone(),
            llm,
            history,
            engine,
            remote_docs,
        }
    }

    /// Answers one question: pick a tool, run it, synthesize a reply.
    ///
    /// The conversation is updated with the question and the reply on
    /// every successful path, whichever tool produced it.
    pub async fn run(
        &self,
        index: &dyn RetrievalIndex,
        question: &str,
        session_id: &str,
    ) -> Result<AgentAnswer, RagError> {
        let (route, input) = self.route(question).await;
        tracing::info!("agent route: {} ({})", route, input);

        match route {
            ToolRoute::Rag => self.answer_from_index(index, &input, session_id).await,
            ToolRoute::WebSearch => {
                let results = web_search(&self.config, &input).await?;
                let tool_output = format!("Web search results:\n{}", format_results(&results));
                let text = self.synthesize(question, &tool_output, session_id).await?;
                let sources = results.into_iter().map(|r| r.url).collect();
                Ok(AgentAnswer {
                    text,
                    sources,
                    route: ToolRoute::WebSearch,
                })
            }
            ToolRoute::RemoteDocs => {
                let Some(remote) = &self.remote_docs else {
                    tracing::warn!("remote docs server not configured, using the document index");
                    return self.answer_from_index(index, &input, session_id).await;
                };
                let content = remote.fetch(&input).await?;
                let tool_output = format!("Remote documents:\n{content}");
                let text = self.synthesize(question, &tool_output, session_id).await?;
                Ok(AgentAnswer {
                    text,
                    sources: Vec::new(),
                    route: ToolRoute::RemoteDocs,
                })
            }
            ToolRoute::Direct => {
                let text = self.synthesize(question, "", session_id).await?;
                Ok(AgentAnswer {
                    text,
                    sources: Vec::new(),
                    route: ToolRoute::Direct,
                })
            }
        }
    }

    async fn answer_from_index(
        &self,
        index: &dyn RetrievalIndex,
        question: &str,
        session_id: &str,
    ) -> Result<AgentAnswer, RagError> {
        let answer = self.engine.answer(index, question, session_id).await?;
        Ok(AgentAnswer {
            text: answer.text,
            sources: answer.sources,
            route: ToolRoute::Rag,
        })
    }

    /// Asks the model to choose a tool. Any failure routes to the
    /// document index with the question unchanged.
    async fn route(&self, question: &str) -> (ToolRoute, String) {
        let prompt = self.route_prompt(question);
        match self.llm.complete(&prompt).await {
            Ok(reply) => match parse_route(&reply) {
                Some((route, input)) => {
                    let input = input.unwrap_or_else(|| question.to_string());
                    (route, input)
                }
                None => {
                    tracing::warn!(
                        "unparseable tool choice, using the document index: {}",
                        reply.trim()
                    );
                    (ToolRoute::Rag, question.to_string())
                }
            },
            Err(e) => {
                tracing::warn!("tool routing failed, using the document index: {e}");
                (ToolRoute::Rag, question.to_string())
            }
        }
    }

    fn route_prompt(&self, question: &str) -> String {
        let mut roster = vec![
            "- rag: search the locally indexed documents",
            "- web_search: search the public web for current information",
        ];
        if self.remote_docs.is_some() {
            roster.push("- remote_docs: fetch pages from the remote documentation server");
        }
        roster.push("- direct: answer from general knowledge without a tool");

        format!(
            "You are a research assistant choosing a tool.\n\n\
             Tools:\n{}\n\n\
             Pick exactly one tool for the question below. Reply with only a JSON object, \
             no prose:\n{{\"tool\": \"<tool name>\", \"input\": \"<what to send to the tool>\"}}\n\n\
             Question:\n{}",
            roster.join("\n"),
            question
        )
    }

    /// Turns one tool's output into a conversational reply and records
    /// the exchange in the session history.
    async fn synthesize(
        &self,
        question: &str,
        tool_output: &str,
        session_id: &str,
    ) -> Result<String, RagError> {
        let history = self
            .history
            .format_history_for_prompt(session_id, self.config.history_window)
            .await;

        let prompt = if tool_output.is_empty() {
            format!(
                "Answer the question below using the conversation and your general \
                 knowledge. Be concise and factual.\n\n\
                 Previous conversation:\n{history}\n\nHuman: {question}\n\nAssistant:"
            )
        } else {
            format!(
                "Use the tool output below to answer the question. If the output does \
                 not contain the answer, say so plainly.\n\n{tool_output}\n\n\
                 Previous conversation:\n{history}\n\nHuman: {question}\n\nAssistant:"
            )
        };

        let text = self.llm.complete(&prompt).await?;
        self.history
            .add_message(session_id, Role::User, question)
            .await;
        self.history
            .add_message(session_id, Role::Assistant, text.clone())
            .await;
        Ok(text)
    }
}

/// Extracts `{"tool": ..., "input": ...}` from a model reply.
///
/// Returns the route plus the input, or `None` when the reply holds no
/// recognizable tool choice. A missing or empty input comes back as
/// `None` so the caller can substitute the original question.
fn parse_route(text: &str) -> Option<(ToolRoute, Option<String>)> {
    let value = parse_json_from_text(text)?;
    let tool = value.get("tool").and_then(|v| v.as_str())?;
    let route = ToolRoute::parse(tool)?;
    let input = value
        .get("input")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    Some((route, input))
}

/// Parses a JSON object out of free-form model text, tolerating code
/// fences and surrounding prose.
fn parse_json_from_text(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::rag::{ChunkRecord, ScoredChunk};

    struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<String, RagError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<String, RagError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, prompt: &str) -> Result<String, RagError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(RagError::Llm("script exhausted".into())))
        }

        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
            Err(RagError::Llm("scripted provider does not embed".into()))
        }
    }

    struct FakeIndex {
        hits: Vec<ScoredChunk>,
    }

    #[async_trait]
    impl RetrievalIndex for FakeIndex {
        async fn upsert(&self, _records: &[ChunkRecord]) -> Result<(), RagError> {
            Ok(())
        }

        async fn query(&self, _text: &str, top_k: usize) -> Result<Vec<ScoredChunk>, RagError> {
            let mut hits = self.hits.clone();
            hits.truncate(top_k);
            Ok(hits)
        }

        async fn count(&self) -> Result<u64, RagError> {
            Ok(self.hits.len() as u64)
        }
    }

    fn agent_with(replies: Vec<Result<String, RagError>>) -> (ResearchAgent, Arc<ConversationStore>) {
        let config = Config::default();
        let history = Arc::new(ConversationStore::new());
        let llm: Arc<dyn LlmProvider> = Arc::new(ScriptedProvider::new(replies));
        let agent = ResearchAgent::new(&config, llm, history.clone(), None);
        (agent, history)
    }

    #[test]
    fn tool_route_parse_accepts_aliases() {
        assert_eq!(ToolRoute::parse("rag"), Some(ToolRoute::Rag));
        assert_eq!(ToolRoute::parse(" Web_Search "), Some(ToolRoute::WebSearch));
        assert_eq!(ToolRoute::parse("remote"), Some(ToolRoute::RemoteDocs));
        assert_eq!(ToolRoute::parse("DIRECT"), Some(ToolRoute::Direct));
        assert_eq!(ToolRoute::parse("tarot"), None);
    }

    #[test]
    fn parse_route_reads_plain_json() {
        let (route, input) = parse_route(r#"{"tool": "web_search", "input": "rust 1.80"}"#)
            .expect("route");
        assert_eq!(route, ToolRoute::WebSearch);
        assert_eq!(input.as_deref(), Some("rust 1.80"));
    }

    #[test]
    fn parse_route_reads_fenced_json() {
        let reply = "Here you go:\n```json\n{\"tool\": \"rag\", \"input\": \"capital of France\"}\n```";
        let (route, input) = parse_route(reply).expect("route");
        assert_eq!(route, ToolRoute::Rag);
        assert_eq!(input.as_deref(), Some("capital of France"));
    }

    #[test]
    fn parse_route_rejects_prose_and_unknown_tools() {
        assert!(parse_route("I would just answer directly.").is_none());
        assert!(parse_route(r#"{"tool": "tarot", "input": "q"}"#).is_none());
    }

    #[test]
    fn parse_route_treats_blank_input_as_missing() {
        let (_, input) = parse_route(r#"{"tool": "direct", "input": "  "}"#).expect("route");
        assert!(input.is_none());
    }

    #[tokio::test]
    async fn direct_route_answers_and_records_history() {
        let (agent, history) = agent_with(vec![
            Ok(r#"{"tool": "direct", "input": "anything"}"#.to_string()),
            Ok("The sky is blue.".to_string()),
        ]);
        let index = FakeIndex { hits: Vec::new() };
        let session = history.create_session().await;

        let answer = agent
            .run(&index, "Why is the sky blue?", &session)
            .await
            .expect("answer");

        assert_eq!(answer.route, ToolRoute::Direct);
        assert_eq!(answer.text, "The sky is blue.");
        assert!(answer.sources.is_empty());

        let messages = history.get_history(&session, None).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "Why is the sky blue?");
        assert_eq!(messages[1].content, "The sky is blue.");
    }

    #[tokio::test]
    async fn routing_failure_falls_back_to_the_document_index() {
        // Route call errors, then the rag path rewrites and answers.
        let (agent, history) = agent_with(vec![
            Err(RagError::Llm("router down".into())),
            Ok("capital of France".to_string()),
            Ok("Paris.".to_string()),
        ]);
        let index = FakeIndex {
            hits: vec![ScoredChunk {
                record: ChunkRecord::new("geo.txt", 0, "Paris is the capital."),
                score: 0.9,
            }],
        };
        let session = history.create_session().await;

        let answer = agent
            .run(&index, "What is the capital of France?", &session)
            .await
            .expect("answer");

        assert_eq!(answer.route, ToolRoute::Rag);
        assert_eq!(answer.text, "Paris.");
        assert_eq!(answer.sources, vec!["geo.txt (chunk 0)".to_string()]);
    }

    #[tokio::test]
    async fn garbled_route_reply_falls_back_to_the_document_index() {
        let (agent, history) = agent_with(vec![
            Ok("let me think about which tool fits".to_string()),
            Ok("rewritten".to_string()),
            Ok("Grounded answer.".to_string()),
        ]);
        let index = FakeIndex { hits: Vec::new() };
        let session = history.create_session().await;

        let answer = agent.run(&index, "hm?", &session).await.expect("answer");
        assert_eq!(answer.route, ToolRoute::Rag);
        assert_eq!(answer.text, "Grounded answer.");
    }

    #[tokio::test]
    async fn remote_docs_route_without_a_server_downgrades_to_rag() {
        let (agent, history) = agent_with(vec![
            Ok(r#"{"tool": "remote_docs", "input": "tokio select"}"#.to_string()),
            Ok("tokio select".to_string()),
            Ok("Use tokio::select!.".to_string()),
        ]);
        let index = FakeIndex { hits: Vec::new() };
        let session = history.create_session().await;

        let answer = agent
            .run(&index, "How do I race futures?", &session)
            .await
            .expect("answer");
        assert_eq!(answer.route, ToolRoute::Rag);
        assert_eq!(answer.text, "Use tokio::select!.");
    }

    #[tokio::test]
    async fn synthesis_prompt_carries_the_original_question() {
        let config = Config::default();
        let history = Arc::new(ConversationStore::new());
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(r#"{"tool": "direct", "input": "a rewritten input"}"#.to_string()),
            Ok("ok".to_string()),
        ]));
        let llm: Arc<dyn LlmProvider> = provider.clone();
        let agent = ResearchAgent::new(&config, llm, history.clone(), None);
        let index = FakeIndex { hits: Vec::new() };
        let session = history.create_session().await;

        agent
            .run(&index, "original question", &session)
            .await
            .expect("answer");

        // The router may rewrite the tool input, but synthesis and the
        // recorded history keep the question the user actually asked.
        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("Human: original question"));
        let messages = history.get_history(&session, None).await;
        assert_eq!(messages[0].content, "original question");
    }

    #[test]
    fn roster_only_lists_configured_tools() {
        let (agent, _) = agent_with(Vec::new());
        let prompt = agent.route_prompt("q");
        assert!(prompt.contains("- rag:"));
        assert!(prompt.contains("- web_search:"));
        assert!(prompt.contains("- direct:"));
        assert!(!prompt.contains("- remote_docs:"));
    }
}
