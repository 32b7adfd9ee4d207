//! Conversational RAG engine.
//!
//! Answers a question in four steps: rewrite the question against the
//! session history, retrieve matching chunks, generate a grounded reply,
//! record the turn. Only the rewrite is allowed to fail softly; a failed
//! generation propagates and leaves the session history untouched.

use std::sync::Arc;

use super::store::RetrievalIndex;
use crate::core::errors::RagError;
use crate::history::{ConversationStore, Role};
use crate::llm::provider::LlmProvider;

const CONTEXTUALIZE_INSTRUCTION: &str =
    "Given a chat history and the latest user question which might reference context in \
     the chat history, formulate a standalone question which can be understood without \
     the chat history. Do NOT answer the question, just reformulate it if needed and \
     otherwise return it as is.";

fn grounded_prompt(context: &str, conversation_history: &str, query: &str) -> String {
    format!(
        "Based on the following context and conversation history, please provide a relevant \
         and contextual response. If the answer cannot be derived from the context, only use \
         the conversation history or say \"I cannot answer this based on the provided \
         information.\"\n\nContext from documents:\n{context}\n\nPrevious conversation:\n\
         {conversation_history}\n\nHuman: {query}\n\nAssistant:"
    )
}

/// Outcome of the history-aware question rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contextualized {
    /// The model produced a standalone form of the question.
    Rewritten(String),
    /// The rewrite call failed; the original question is used as-is.
    Recovered(String),
}

impl Contextualized {
    /// The question to retrieve and generate with, whichever way it came.
    pub fn query(&self) -> &str {
        match self {
            Contextualized::Rewritten(q) | Contextualized::Recovered(q) => q,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RagAnswer {
    pub text: String,
    /// Citations in retrieval rank order, e.g. `geo.txt (chunk 0)`.
    pub sources: Vec<String>,
}

pub struct RagEngine {
    history: Arc<ConversationStore>,
    llm: Arc<dyn LlmProvider>,
    top_k: usize,
    history_window: usize,
}

impl RagEngine {
    pub fn new(history: Arc<ConversationStore>, llm: Arc<dyn LlmProvider>) -> Self {
        Self::with_limits(history, llm, 3, 5)
    }

    pub fn with_limits(
        history: Arc<ConversationStore>,
        llm: Arc<dyn LlmProvider>,
        top_k: usize,
        history_window: usize,
    ) -> Self {
        Self {
            history,
            llm,
            top_k,
            history_window,
        }
    }

    /// Rewrites `question` into a standalone form using the session
    /// history. A failed LLM call downgrades to the original question
    /// instead of propagating.
    pub async fn contextualize(&self, session_id: &str, question: &str) -> Contextualized {
        let history = self
            .history
            .format_history_for_prompt(session_id, self.history_window)
            .await;
        let prompt = format!(
            "{}\n\nChat history:\n{}\n\nQuestion:\n{}",
            CONTEXTUALIZE_INSTRUCTION, history, question
        );

        match self.llm.complete(&prompt).await {
            Ok(rewritten) => Contextualized::Rewritten(rewritten.trim().to_string()),
            Err(e) => {
                tracing::warn!("question rewrite failed, using the original: {}", e);
                Contextualized::Recovered(question.to_string())
            }
        }
    }

    /// Answers `question` within the given session: rewrite, retrieve,
    /// generate, then append the user/assistant turn to the history.
    pub async fn answer(
        &self,
        index: &dyn RetrievalIndex,
        question: &str,
        session_id: &str,
    ) -> Result<RagAnswer, RagError> {
        let contextualized = self.contextualize(session_id, question).await;
        let effective = contextualized.query();

        let hits = index.query(effective, self.top_k).await?;
        let context = hits
            .iter()
            .map(|hit| hit.record.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let sources: Vec<String> = hits.iter().map(|hit| hit.record.citation()).collect();

        let conversation = self
            .history
            .format_history_for_prompt(session_id, self.history_window)
            .await;
        let prompt = grounded_prompt(&context, &conversation, effective);
        let text = self.llm.complete(&prompt).await?;

        self.history
            .add_message(session_id, Role::User, effective)
            .await;
        self.history
            .add_message(session_id, Role::Assistant, text.clone())
            .await;

        Ok(RagAnswer { text, sources })
    }
}
