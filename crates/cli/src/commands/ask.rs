use std::sync::Arc;

use crate::commands::context::context_router;
use crate::commands::{finish, open_database, prepare, CommandResult, StepFailure};
use stocktalk_agent::{AgentRuntime, GeminiClient, RetryPolicy};
use stocktalk_core::domain::account::AccountId;

/// One question, no stored history. Model failures come back as the
/// assistant's fallback text with a zero exit code.
pub fn run(account: &str, message: &str) -> CommandResult {
    let (config, runtime) = match prepare("ask") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let llm = match GeminiClient::new(&config.llm) {
        Ok(llm) => llm,
        Err(error) => {
            return CommandResult::failure("ask", "model_configuration", error.to_string(), 2)
        }
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let agent = AgentRuntime::new(context_router(&config, &pool), Arc::new(llm))
            .with_retry_policy(RetryPolicy::from_config(&config.llm));

        let reply: Result<_, StepFailure> = agent
            .respond(&[], message, &AccountId::new(account))
            .await
            .map_err(|error| ("invalid_message", error.to_string(), 7u8));
        pool.close().await;

        reply.map(|reply| reply.content)
    });

    finish("ask", result)
}
