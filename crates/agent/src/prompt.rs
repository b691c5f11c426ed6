use thiserror::Error;

use stocktalk_core::domain::chat::{ConversationTurn, TurnRole};

pub const SYSTEM_INSTRUCTIONS: &str = "You are Stocktalk, an inventory assistant for a small \
business. Answer questions about the user's products, stock levels, categories, and sales using \
only the inventory data provided below.

Formatting rules:
- Keep answers short and use plain text with simple bullet lists.
- Quote monetary amounts exactly as they appear in the inventory data, including the currency \
symbol.
- When you calculate a figure, show the arithmetic that produced it.
- Data marked (SAMPLE DATA) is illustrative; say so if you rely on it.
- If the inventory data does not contain the answer, say that you don't know. Never invent \
products, figures, or dates.";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("conversation history contains no user message")]
    NoUserMessage,
}

/// Index of the newest user turn with non-blank content.
pub fn latest_user_turn(history: &[ConversationTurn]) -> Option<usize> {
    history
        .iter()
        .rposition(|turn| turn.role == TurnRole::User && !turn.content.trim().is_empty())
}

#[derive(Clone, Debug)]
pub struct PromptAssembler {
    instructions: String,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self { instructions: SYSTEM_INSTRUCTIONS.to_string() }
    }
}

impl PromptAssembler {
    pub fn with_instructions(instructions: impl Into<String>) -> Self {
        Self { instructions: instructions.into() }
    }

    /// Builds the single text prompt sent to the model: instructions, the
    /// context document, the turns before the newest user message oldest
    /// first, then that message. The history block is left out when nothing
    /// precedes it.
    pub fn assemble(
        &self,
        history: &[ConversationTurn],
        context: &str,
    ) -> Result<String, PromptError> {
        let current = latest_user_turn(history).ok_or(PromptError::NoUserMessage)?;

        let mut prompt = String::new();
        prompt.push_str(&self.instructions);
        prompt.push_str("\n\nINVENTORY DATA:\n");
        prompt.push_str(context);
        prompt.push_str("\n\n");

        // Turns after the current message are not part of the conversation so far.
        let earlier = history[..current]
            .iter()
            .map(|turn| format!("{}{}", turn.role.prompt_prefix(), turn.content.trim()))
            .collect::<Vec<_>>();
        if !earlier.is_empty() {
            prompt.push_str("Previous conversation:\n");
            prompt.push_str(&earlier.join("\n"));
            prompt.push_str("\n\n");
        }

        prompt.push_str("Current message: ");
        prompt.push_str(history[current].content.trim());
        Ok(prompt)
    }
}
