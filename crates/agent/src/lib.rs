//! Contextual retrieval and prompt assembly for the inventory assistant.
//!
//! A chat turn flows through four stages:
//! 1. **Routing** (`router`) - keyword sets in the utterance pick which
//!    sections join the always-present inventory summary.
//! 2. **Sections** (`sections`) - account-scoped reads rendered as text,
//!    degrading to `fallback` content when a read fails.
//! 3. **Prompt** (`prompt`) - instructions, context, and history in one
//!    text prompt.
//! 4. **Model call** (`llm`, `runtime`) - Gemini `generateContent` under a
//!    bounded retry policy, with every failure mapped to displayable text.

pub mod fallback;
pub mod llm;
pub mod prompt;
pub mod router;
pub mod runtime;
pub mod sections;

#[cfg(test)]
mod test_support;

pub use fallback::{FallbackProvider, SampleDataFallback};
pub use llm::{GeminiClient, LlmClient, LlmError, RetryPolicy};
pub use prompt::{PromptAssembler, PromptError};
pub use router::{ContextRouter, EntityKind, Intent, Route, RouterOptions};
pub use runtime::{AgentRuntime, ChatReply};
pub use sections::{SectionBuilder, SectionKind, SectionRequest};
