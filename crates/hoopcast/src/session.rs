// Draft session: one conversation's draft state and the query pipeline.
//
// Each transport connection owns one `DraftSession`. Calls to
// `process_query` take `&mut self`, so turns on a session are serialized by
// construction.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::context::ContextAggregator;
use crate::draft::extract::{extract, is_next_pick_query};
use crate::draft::serpentine::next_pick;
use crate::draft::state::{ConversationLog, DraftState, Role};
use crate::llm::client::{CompletionService, LlmError};
use crate::llm::prompt;

/// Reply used when the model produced no text.
pub const NO_ANSWER: &str = "No answer generated.";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Shared services from which per-connection sessions are created.
#[derive(Clone)]
pub struct SessionFactory {
    completion: Arc<dyn CompletionService>,
    context: Arc<ContextAggregator>,
    max_tokens: u32,
    max_history: usize,
}

impl SessionFactory {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        context: Arc<ContextAggregator>,
        max_tokens: u32,
        max_history: usize,
    ) -> Self {
        SessionFactory {
            completion,
            context,
            max_tokens,
            max_history,
        }
    }

    pub fn from_config(
        config: &Config,
        completion: Arc<dyn CompletionService>,
        context: Arc<ContextAggregator>,
    ) -> Self {
        Self::new(
            completion,
            context,
            config.llm.max_tokens,
            config.session.max_history,
        )
    }

    /// A fresh session with no draft state and an empty log.
    pub fn create(&self) -> DraftSession {
        DraftSession::new(
            Arc::clone(&self.completion),
            Arc::clone(&self.context),
            self.max_tokens,
        )
        .with_history_cap(self.max_history)
    }
}

pub struct DraftSession {
    state: DraftState,
    history: ConversationLog,
    completion: Arc<dyn CompletionService>,
    context: Arc<ContextAggregator>,
    max_tokens: u32,
}

impl DraftSession {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        context: Arc<ContextAggregator>,
        max_tokens: u32,
    ) -> Self {
        DraftSession {
            state: DraftState::new(),
            history: ConversationLog::default(),
            completion,
            context,
            max_tokens,
        }
    }

    /// Keep at most `max_turns` conversation turns (0 keeps all).
    pub fn with_history_cap(mut self, max_turns: usize) -> Self {
        self.history = ConversationLog::new(max_turns);
        self
    }

    pub fn state(&self) -> &DraftState {
        &self.state
    }

    pub fn history(&self) -> &ConversationLog {
        &self.history
    }

    /// Run one conversational turn and return the reply text.
    ///
    /// State updates recognized in the utterance are applied before the
    /// prompt is built. When the utterance reports a pick ("I drafted ...")
    /// and a pick number is known, the pick moves forward one round after
    /// the completion attempt, whether or not it succeeded. Never fails:
    /// backend failures come back as a `Backend error:` reply.
    pub async fn process_query(&mut self, utterance: &str) -> String {
        info!(utterance, "processing query");
        self.history.push(Role::User, utterance);

        let extraction = extract(utterance);
        debug!(?extraction, "extracted state updates");
        self.state.apply(&extraction);

        if is_next_pick_query(utterance) {
            if let Some(current) = self.state.current_pick {
                match next_pick(current) {
                    Some(next) => {
                        info!(current, next, "resolved next serpentine pick");
                        self.state.current_pick = Some(next);
                    }
                    None => warn!(current, "next serpentine pick out of range; keeping current"),
                }
            }
        }
        info!(
            pick = %self.state.pick_label(),
            drafted = self.state.drafted_players.len(),
            "draft state for this turn"
        );

        let outcome = self.recommend(utterance).await;

        if extraction.drafted_phrase_matched() && self.state.pick_known() {
            self.state.advance_one_round();
            info!(pick = %self.state.pick_label(), "advanced pick one round after drafting");
        }

        let reply = match outcome {
            Ok(text) if text.is_empty() => NO_ANSWER.to_string(),
            Ok(text) => text,
            Err(e) => {
                warn!("recommendation failed: {}", e);
                format!("Backend error: {e}")
            }
        };

        self.history.push(Role::Assistant, reply.as_str());
        reply
    }

    async fn recommend(&self, utterance: &str) -> Result<String, SessionError> {
        let context = self.context.build_context().await;
        let prompt = prompt::prompt_for_state(&context, utterance, &self.state);
        debug!(prompt_chars = prompt.len(), "requesting completion");

        let segments = self.completion.complete(&prompt, self.max_tokens).await?;
        let mut reply = String::new();
        for segment in &segments {
            reply.push_str(segment);
            reply.push('\n');
        }
        Ok(reply.trim().to_string())
    }
}
