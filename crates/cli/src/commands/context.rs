use std::sync::Arc;

use crate::commands::{finish, open_database, prepare, CommandResult, StepFailure};
use stocktalk_agent::{ContextRouter, Intent, RouterOptions, SampleDataFallback};
use stocktalk_core::config::AppConfig;
use stocktalk_core::domain::account::AccountId;
use stocktalk_db::repositories::SqlInventoryRepository;
use stocktalk_db::DbPool;

/// Prints what the router would inject for `message`. The model is never called.
pub fn run(account: &str, message: &str) -> CommandResult {
    let (config, runtime) = match prepare("context") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let router = context_router(&config, &pool);

        let intents = router.classify(message);
        let context = router.build_context(&AccountId::new(account), message).await;
        pool.close().await;

        Ok::<String, StepFailure>(format!("Intents: {}\n\n{context}", describe(&intents)))
    });

    finish("context", result)
}

pub(crate) fn context_router(config: &AppConfig, pool: &DbPool) -> ContextRouter {
    ContextRouter::new(
        Arc::new(SqlInventoryRepository::new(pool.clone())),
        Arc::new(SampleDataFallback),
        RouterOptions {
            product_limit: config.assistant.product_limit,
            default_currency: config.assistant.default_currency,
        },
    )
}

fn describe(intents: &[Intent]) -> String {
    if intents.is_empty() {
        return "none (summary only)".to_string();
    }
    intents.iter().map(Intent::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use stocktalk_agent::Intent;

    use super::describe;

    #[test]
    fn intents_render_in_route_order() {
        assert_eq!(describe(&[Intent::Product, Intent::Value]), "product, value");
        assert_eq!(describe(&[]), "none (summary only)");
    }
}
