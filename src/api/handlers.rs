use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use serde::Deserialize;

use crate::common::{ChatMessage, Participant, validation};
use crate::error::ChatError;
use crate::presence::PresenceEngine;

use super::USER_HEADER;

type Engine = State<Arc<PresenceEngine>>;

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub limit: Option<String>,
}

fn user(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
}

/// POST /participants
pub async fn join(
    State(engine): Engine,
    body: Result<Json<JoinRequest>, JsonRejection>,
) -> Result<StatusCode, ChatError> {
    let Json(request) = body?;
    engine.join(&request.name)?;
    Ok(StatusCode::CREATED)
}

/// GET /participants
pub async fn list_participants(
    State(engine): Engine,
) -> Result<Json<Vec<Participant>>, ChatError> {
    Ok(Json(engine.list_active()?))
}

/// POST /messages
pub async fn post_message(
    State(engine): Engine,
    headers: HeaderMap,
    body: Result<Json<PostMessageRequest>, JsonRejection>,
) -> Result<StatusCode, ChatError> {
    let Json(request) = body?;
    let from = user(&headers).unwrap_or_default();
    engine.post_message(from, &request.to, &request.text, &request.kind)?;
    Ok(StatusCode::CREATED)
}

/// GET /messages?limit=N
pub async fn list_messages(
    State(engine): Engine,
    headers: HeaderMap,
    query: Result<Query<MessagesQuery>, QueryRejection>,
) -> Result<Json<Vec<ChatMessage>>, ChatError> {
    // Identity is checked before the query string.
    let viewer = validation::viewer(user(&headers))?;
    let Query(query) = query?;
    let messages = engine.fetch_messages(Some(&viewer), query.limit.as_deref())?;
    Ok(Json(messages))
}

/// POST /status
pub async fn heartbeat(State(engine): Engine, headers: HeaderMap) -> Result<StatusCode, ChatError> {
    engine.heartbeat(user(&headers).unwrap_or_default())?;
    Ok(StatusCode::OK)
}
