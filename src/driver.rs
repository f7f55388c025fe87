//! Chain driver - one customer turn at a time
//!
//! Decides where to resume the chain from the session state:
//! - no category yet: INTERPRET → CATEGORIZE, then EXTRACT
//! - category open:   EXTRACT only
//! - extraction ready: FINALIZE, then resolve the topic

use crate::category::Category;
use crate::chain::PromptChainProcessor;
use crate::config::AppConfig;
use crate::error::ChainError;
use crate::extraction::parse_extraction;
use crate::gemini::GeminiClient;
use crate::session::{MessageRole, Session};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

pub const EMPTY_INPUT_REPLY: &str = "Please enter a message.";
pub const NEED_MORE_DETAILS: &str = "Could you provide more details?";
pub const PROCESSED_FALLBACK: &str = "Your request has been processed.";

/// How a turn ended
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    /// Blank input, no model call made
    EmptyInput,
    /// Extraction asked for more information
    NeedsInfo,
    /// Final response stage produced the reply
    Resolved,
    /// Ready, but the final stage failed or was empty; extraction text used
    ResolvedWithFallback,
    /// Extraction reply had no usable JSON object; raw text returned
    Unstructured,
    /// A model call failed; reply is the error text
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnReply {
    pub text: String,
    pub outcome: TurnOutcome,
    /// Category the turn ran under, if one was chosen
    pub category: Option<Category>,
}

impl TurnReply {
    fn new(text: impl Into<String>, outcome: TurnOutcome, category: Option<Category>) -> Self {
        Self {
            text: text.into(),
            outcome,
            category,
        }
    }

    fn failed(error: ChainError, category: Option<Category>) -> Self {
        Self::new(error.to_string(), TurnOutcome::Failed, category)
    }

    pub fn is_error(&self) -> bool {
        self.outcome == TurnOutcome::Failed
    }
}

pub struct ChainDriver {
    processor: PromptChainProcessor,
    reset_on_resolve: bool,
}

impl ChainDriver {
    pub fn new(processor: PromptChainProcessor, reset_on_resolve: bool) -> Self {
        Self {
            processor,
            reset_on_resolve,
        }
    }

    /// Driver backed by the Gemini client described by `config`
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = GeminiClient::from_config(config)?;
        let processor = PromptChainProcessor::new(Arc::new(client), config.category_strategy);
        Ok(Self::new(processor, config.reset_on_resolve))
    }

    pub fn processor(&self) -> &PromptChainProcessor {
        &self.processor
    }

    /// Run one turn and record both sides of it in the transcript.
    /// Blank input is answered but not recorded.
    pub async fn respond(&self, session: &mut Session, input: &str) -> TurnReply {
        if input.trim().is_empty() {
            return TurnReply::new(EMPTY_INPUT_REPLY, TurnOutcome::EmptyInput, session.category());
        }

        session.push_turn(MessageRole::User, input);
        let reply = self.handle_turn(session, input).await;
        session.push_turn(MessageRole::Assistant, reply.text.clone());
        reply
    }

    /// Run one turn against the session without touching the transcript.
    ///
    /// Never fails: model errors come back as `TurnOutcome::Failed` with the
    /// `Error:` text. Session changes made before a failure are kept.
    pub async fn handle_turn(&self, session: &mut Session, input: &str) -> TurnReply {
        let user_input = input.trim();
        if user_input.is_empty() {
            return TurnReply::new(EMPTY_INPUT_REPLY, TurnOutcome::EmptyInput, session.category());
        }

        let (category, interpreted) = match session.category() {
            Some(category) => (
                category,
                session
                    .interpreted_intent()
                    .unwrap_or(user_input)
                    .to_string(),
            ),
            None => match self.open_topic(session, user_input).await {
                Ok(opened) => opened,
                Err(e) => {
                    warn!(session_id = %session.session_id, "Could not open topic: {}", e);
                    return TurnReply::failed(e, None);
                }
            },
        };

        let raw = match self
            .processor
            .extract_details(&interpreted, user_input, category, session.collected_data())
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(session_id = %session.session_id, category = %category, "Extraction failed: {}", e);
                return TurnReply::failed(e, Some(category));
            }
        };

        let Some(extraction) = parse_extraction(&raw) else {
            info!(session_id = %session.session_id, "Extraction reply had no JSON object, returning raw text");
            return TurnReply::new(raw, TurnOutcome::Unstructured, Some(category));
        };

        let ready = extraction.is_ready();
        let user_message = extraction.user_message().map(str::to_string);
        let response_to_user = extraction.response_to_user().map(str::to_string);
        session.merge_collected(extraction.extracted_data);

        if !ready {
            return TurnReply::new(
                user_message.unwrap_or_else(|| NEED_MORE_DETAILS.to_string()),
                TurnOutcome::NeedsInfo,
                Some(category),
            );
        }

        let reply = match self
            .processor
            .generate_final_response(category, session.collected_data())
            .await
        {
            Ok(text) if !text.trim().is_empty() => TurnReply::new(text, TurnOutcome::Resolved, Some(category)),
            Ok(_) => {
                warn!(session_id = %session.session_id, "Final response was empty, using extraction text");
                Self::resolved_fallback(response_to_user, category)
            }
            Err(e) => {
                warn!(session_id = %session.session_id, "Final response failed, using extraction text: {}", e);
                Self::resolved_fallback(response_to_user, category)
            }
        };

        session.resolve_topic(self.reset_on_resolve);
        info!(
            session_id = %session.session_id,
            category = %category,
            reset = self.reset_on_resolve,
            "Topic resolved"
        );

        reply
    }

    async fn open_topic(&self, session: &mut Session, user_input: &str) -> Result<(Category, String)> {
        let interpreted = self.processor.interpret_intent(user_input).await?;
        let category = self.processor.categorize(&interpreted).await?;

        session.open_topic(category, interpreted.clone());
        info!(session_id = %session.session_id, category = %category, "Topic opened");

        Ok((category, interpreted))
    }

    fn resolved_fallback(response_to_user: Option<String>, category: Category) -> TurnReply {
        TurnReply::new(
            response_to_user.unwrap_or_else(|| PROCESSED_FALLBACK.to_string()),
            TurnOutcome::ResolvedWithFallback,
            Some(category),
        )
    }
}
