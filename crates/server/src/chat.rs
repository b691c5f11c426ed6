//! Chat session endpoints. Every route is scoped to the `x-account-id` account.
//!
//! - `POST   /chat/sessions`                 create a session
//! - `GET    /chat/sessions`                 list sessions, most recently active first
//! - `DELETE /chat/sessions`                 delete every session of the account
//! - `PATCH  /chat/sessions/{id}`            rename a session
//! - `DELETE /chat/sessions/{id}`            delete a session and its turns
//! - `GET    /chat/sessions/{id}/messages`   list the session's turns, oldest first
//! - `POST   /chat/sessions/{id}/messages`   add a user message and return the assistant reply

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use stocktalk_agent::AgentRuntime;
use stocktalk_core::domain::account::AccountId;
use stocktalk_core::domain::chat::{ChatSession, ChatSessionId, ConversationTurn};
use stocktalk_core::errors::{ApplicationError, DomainError, InterfaceError};
use stocktalk_db::{ChatRepository, RepositoryError};
use tracing::{error, info, warn};
use uuid::Uuid;

pub const ACCOUNT_HEADER: &str = "x-account-id";
const DEFAULT_TITLE: &str = "New Chat";

#[derive(Clone)]
pub struct ChatState {
    chats: Arc<dyn ChatRepository>,
    runtime: Arc<AgentRuntime>,
}

impl ChatState {
    pub fn new(chats: Arc<dyn ChatRepository>, runtime: Arc<AgentRuntime>) -> Self {
        Self { chats, runtime }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RenameSessionRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PostMessageRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionList {
    pub sessions: Vec<ChatSession>,
}

#[derive(Debug, Serialize)]
pub struct DeletedSessions {
    pub deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct SessionMessages {
    pub session_id: String,
    pub messages: Vec<ConversationTurn>,
}

#[derive(Debug, Serialize)]
pub struct MessageExchange {
    pub session_id: String,
    pub user: ConversationTurn,
    pub assistant: ConversationTurn,
}

#[derive(Debug, Serialize)]
pub struct ChatError {
    pub error: String,
    pub correlation_id: String,
}

type Rejection = (StatusCode, Json<ChatError>);

pub fn router(state: ChatState) -> Router {
    Router::new()
        .route(
            "/chat/sessions",
            post(create_session).get(list_sessions).delete(delete_all_sessions),
        )
        .route("/chat/sessions/{id}", patch(rename_session).delete(delete_session))
        .route("/chat/sessions/{id}/messages", get(list_messages).post(post_message))
        .with_state(state)
}

pub async fn create_session(
    State(state): State<ChatState>,
    headers: HeaderMap,
    Json(body): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<ChatSession>), Rejection> {
    let correlation_id = new_correlation_id();
    let account = account_from(&headers, &correlation_id)?;

    let title = body
        .title
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let session = ChatSession::new(account, title);

    state
        .chats
        .create_session(session.clone())
        .await
        .map_err(|error| persistence(error, &correlation_id))?;

    info!(
        event_name = "chat.session.created",
        correlation_id = %correlation_id,
        account_id = %session.account_id,
        session_id = %session.id.0,
        "chat session created"
    );
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn list_sessions(
    State(state): State<ChatState>,
    headers: HeaderMap,
) -> Result<Json<SessionList>, Rejection> {
    let correlation_id = new_correlation_id();
    let account = account_from(&headers, &correlation_id)?;

    let sessions = state
        .chats
        .list_sessions(&account)
        .await
        .map_err(|error| persistence(error, &correlation_id))?;

    Ok(Json(SessionList { sessions }))
}

pub async fn rename_session(
    State(state): State<ChatState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<RenameSessionRequest>,
) -> Result<Json<ChatSession>, Rejection> {
    let correlation_id = new_correlation_id();
    let account = account_from(&headers, &correlation_id)?;

    let title = body.title.unwrap_or_default();
    let title = title.trim();
    if title.is_empty() {
        return Err(reject(
            ApplicationError::from(DomainError::EmptyTitle).into_interface(&correlation_id),
        ));
    }

    let id = ChatSessionId(id);
    match state.chats.rename_session(&account, &id, title).await {
        Ok(Some(session)) => {
            info!(
                event_name = "chat.session.renamed",
                correlation_id = %correlation_id,
                account_id = %account,
                session_id = %session.id.0,
                "chat session renamed"
            );
            Ok(Json(session))
        }
        Ok(None) => Err(not_found(&account, id, &correlation_id)),
        Err(error) => Err(persistence(error, &correlation_id)),
    }
}

pub async fn delete_session(
    State(state): State<ChatState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, Rejection> {
    let correlation_id = new_correlation_id();
    let account = account_from(&headers, &correlation_id)?;

    let id = ChatSessionId(id);
    match state.chats.delete_session(&account, &id).await {
        Ok(true) => {
            info!(
                event_name = "chat.session.deleted",
                correlation_id = %correlation_id,
                account_id = %account,
                session_id = %id.0,
                "chat session deleted"
            );
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(false) => Err(not_found(&account, id, &correlation_id)),
        Err(error) => Err(persistence(error, &correlation_id)),
    }
}

pub async fn delete_all_sessions(
    State(state): State<ChatState>,
    headers: HeaderMap,
) -> Result<Json<DeletedSessions>, Rejection> {
    let correlation_id = new_correlation_id();
    let account = account_from(&headers, &correlation_id)?;

    let deleted = state
        .chats
        .delete_all_sessions(&account)
        .await
        .map_err(|error| persistence(error, &correlation_id))?;

    info!(
        event_name = "chat.session.deleted_all",
        correlation_id = %correlation_id,
        account_id = %account,
        deleted,
        "chat sessions cleared"
    );
    Ok(Json(DeletedSessions { deleted }))
}

pub async fn list_messages(
    State(state): State<ChatState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SessionMessages>, Rejection> {
    let correlation_id = new_correlation_id();
    let account = account_from(&headers, &correlation_id)?;
    let session = owned_session(&state, &account, ChatSessionId(id), &correlation_id).await?;

    let messages = state
        .chats
        .list_turns(&session.id)
        .await
        .map_err(|error| persistence(error, &correlation_id))?;

    Ok(Json(SessionMessages { session_id: session.id.0, messages }))
}

/// Stores the user turn, asks the runtime for a reply, then stores the
/// assistant turn. Model failures arrive here as reply text.
pub async fn post_message(
    State(state): State<ChatState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<PostMessageRequest>,
) -> Result<Json<MessageExchange>, Rejection> {
    let correlation_id = new_correlation_id();
    let account = account_from(&headers, &correlation_id)?;

    let message = body.message.unwrap_or_default();
    let message = message.trim();
    if message.is_empty() {
        return Err(reject(
            ApplicationError::from(DomainError::EmptyMessage).into_interface(&correlation_id),
        ));
    }

    let session = owned_session(&state, &account, ChatSessionId(id), &correlation_id).await?;
    let history = state
        .chats
        .list_turns(&session.id)
        .await
        .map_err(|error| persistence(error, &correlation_id))?;

    let user_turn = ConversationTurn::user(message);
    state
        .chats
        .append_turn(&session.id, user_turn.clone())
        .await
        .map_err(|error| persistence(error, &correlation_id))?;

    let reply = state.runtime.respond(&history, message, &account).await.map_err(|_| {
        reject(ApplicationError::from(DomainError::EmptyMessage).into_interface(&correlation_id))
    })?;

    let assistant_turn = ConversationTurn {
        timestamp: reply.timestamp,
        ..ConversationTurn::assistant(reply.content)
    };
    state
        .chats
        .append_turn(&session.id, assistant_turn.clone())
        .await
        .map_err(|error| persistence(error, &correlation_id))?;

    info!(
        event_name = "chat.message.answered",
        correlation_id = %correlation_id,
        account_id = %account,
        session_id = %session.id.0,
        history_turns = history.len(),
        "assistant reply stored"
    );

    Ok(Json(MessageExchange {
        session_id: session.id.0,
        user: user_turn,
        assistant: assistant_turn,
    }))
}

async fn owned_session(
    state: &ChatState,
    account: &AccountId,
    id: ChatSessionId,
    correlation_id: &str,
) -> Result<ChatSession, Rejection> {
    match state.chats.find_session(account, &id).await {
        Ok(Some(session)) => Ok(session),
        Ok(None) => Err(not_found(account, id, correlation_id)),
        Err(error) => Err(persistence(error, correlation_id)),
    }
}

fn not_found(account: &AccountId, id: ChatSessionId, correlation_id: &str) -> Rejection {
    reject(
        ApplicationError::from(DomainError::SessionNotFound(account.0.clone(), id.0))
            .into_interface(correlation_id),
    )
}

fn account_from(headers: &HeaderMap, correlation_id: &str) -> Result<AccountId, Rejection> {
    headers
        .get(ACCOUNT_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(AccountId::new)
        .ok_or_else(|| {
            reject(InterfaceError::BadRequest {
                message: format!("The `{ACCOUNT_HEADER}` header is required."),
                correlation_id: correlation_id.to_string(),
            })
        })
}

fn persistence(error: RepositoryError, correlation_id: &str) -> Rejection {
    reject(ApplicationError::Persistence(error.to_string()).into_interface(correlation_id))
}

fn reject(error: InterfaceError) -> Rejection {
    let status = match &error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!(
            event_name = "chat.request.failed",
            correlation_id = error.correlation_id(),
            error = %error,
            "chat request failed"
        );
    } else {
        warn!(
            event_name = "chat.request.rejected",
            correlation_id = error.correlation_id(),
            error = %error,
            "chat request rejected"
        );
    }

    let body = ChatError {
        error: error.user_message().to_string(),
        correlation_id: error.correlation_id().to_string(),
    };
    (status, Json(body))
}

fn new_correlation_id() -> String {
    format!("req-{}", Uuid::new_v4())
}
