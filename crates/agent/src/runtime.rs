use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use stocktalk_core::domain::account::AccountId;
use stocktalk_core::domain::chat::ConversationTurn;

use crate::llm::{LlmClient, LlmError, RetryPolicy};
use crate::prompt::{latest_user_turn, PromptAssembler, PromptError};
use crate::router::ContextRouter;

pub const NO_USER_MESSAGE_REPLY: &str = "I couldn't understand your request. Please try again.";
pub const TIMEOUT_REPLY: &str = "I'm having trouble connecting to the knowledge base right now. \
Please try again in a moment.";
pub const TRANSPORT_REPLY: &str =
    "I couldn't reach the knowledge base. Please check your connection and try again.";
pub const MALFORMED_REPLY: &str =
    "I received an invalid response from the knowledge base. Please try again.";

/// Assistant text ready to be persisted as the next turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Turns a conversation into one assistant reply. Every failure past the
/// empty-message check becomes displayable text.
pub struct AgentRuntime {
    router: ContextRouter,
    assembler: PromptAssembler,
    llm: Arc<dyn LlmClient>,
    retry: RetryPolicy,
}

impl AgentRuntime {
    pub fn new(router: ContextRouter, llm: Arc<dyn LlmClient>) -> Self {
        Self { router, assembler: PromptAssembler::default(), llm, retry: RetryPolicy::default() }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_assembler(mut self, assembler: PromptAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn router(&self) -> &ContextRouter {
        &self.router
    }

    pub async fn generate(&self, history: &[ConversationTurn], account: &AccountId) -> String {
        self.generate_at(history, account, Utc::now()).await
    }

    pub async fn generate_at(
        &self,
        history: &[ConversationTurn],
        account: &AccountId,
        now: DateTime<Utc>,
    ) -> String {
        let Some(current) = latest_user_turn(history) else {
            warn!(
                event_name = "agent.generate.no_user_message",
                account_id = %account,
                turns = history.len(),
                "history has no user message, model not called"
            );
            return NO_USER_MESSAGE_REPLY.to_string();
        };

        let context = self.router.build_context_at(account, &history[current].content, now).await;
        let prompt = match self.assembler.assemble(history, &context) {
            Ok(prompt) => prompt,
            Err(PromptError::NoUserMessage) => return NO_USER_MESSAGE_REPLY.to_string(),
        };

        let llm = self.llm.as_ref();
        let prompt = prompt.as_str();
        match self.retry.run(|| llm.complete(prompt)).await {
            Ok(text) => {
                info!(
                    event_name = "agent.generate.completed",
                    account_id = %account,
                    reply_chars = text.len(),
                    "model reply received"
                );
                text
            }
            Err(failure) => {
                error!(
                    event_name = "agent.generate.failed",
                    account_id = %account,
                    error = %failure,
                    "model call failed, replying with fallback message"
                );
                reply_for(failure)
            }
        }
    }

    /// Appends `message` as the newest user turn and generates the reply.
    /// A blank message is a usage error and never reaches the model.
    pub async fn respond(
        &self,
        history: &[ConversationTurn],
        message: &str,
        account: &AccountId,
    ) -> Result<ChatReply, PromptError> {
        if message.trim().is_empty() {
            return Err(PromptError::NoUserMessage);
        }

        let mut turns = history.to_vec();
        turns.push(ConversationTurn::user(message.trim()));
        let content = self.generate(&turns, account).await;
        Ok(ChatReply { content, timestamp: Utc::now() })
    }
}

fn reply_for(failure: LlmError) -> String {
    match failure {
        LlmError::Timeout => TIMEOUT_REPLY.to_string(),
        LlmError::Transport(_) | LlmError::Configuration(_) => TRANSPORT_REPLY.to_string(),
        LlmError::MalformedResponse(_) => MALFORMED_REPLY.to_string(),
        LlmError::Api { message, .. } => message,
    }
}
