use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use stocktalk_db::{migrations, ping, DbPool};

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    model: String,
}

impl HealthState {
    pub fn new(db_pool: DbPool, model: impl Into<String>) -> Self {
        Self { db_pool, model: model.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

impl HealthCheck {
    fn ready(detail: impl Into<String>) -> Self {
        Self { status: "ready", detail: detail.into() }
    }

    fn degraded(detail: impl Into<String>) -> Self {
        Self { status: "degraded", detail: detail.into() }
    }

    fn is_ready(&self) -> bool {
        self.status == "ready"
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub assistant: HealthCheck,
    pub database: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// Readiness follows the inventory store. The model endpoint is not probed.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = probe_database(&state.db_pool).await;
    let ready = database.is_ready();

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        assistant: HealthCheck::ready(format!("model `{}` configured", state.model)),
        database,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn probe_database(pool: &DbPool) -> HealthCheck {
    if let Err(error) = ping(pool).await {
        return HealthCheck::degraded(format!("inventory store unreachable: {error}"));
    }

    match migrations::status(pool).await {
        Ok(status) if status.is_current() => HealthCheck::ready("inventory store reachable"),
        Ok(status) => HealthCheck::degraded(format!(
            "schema behind: {} of {} migrations applied",
            status.applied, status.expected
        )),
        Err(error) => HealthCheck::degraded(format!("schema check failed: {error}")),
    }
}
