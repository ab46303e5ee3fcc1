use axum::{Extension, Json, extract::State};
use tracing::info;

use dahak_db::models::NewMessage;
use dahak_types::api::{Claims, MessageInput, ReadUpdate, Success};
use dahak_types::models::ContactMessage;

use crate::auth::{AppState, run_db};
use crate::convert::{self, clean_opt, required};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};

/// POST /api/messages: contact form.
pub async fn send_message(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<MessageInput>,
) -> Result<Json<Success>, ApiError> {
    let message = NewMessage {
        name: required(&input.name, "name")?,
        email: clean_opt(input.email),
        phone: required(&input.phone, "phone")?,
        message: required(&input.message, "message")?,
    };
    let id = run_db(&state, move |db| db.create_message(&message)).await?;
    info!("New contact message {}", id);
    Ok(Json(Success::ok()))
}

pub async fn get_messages(
    State(state): State<AppState>,
) -> Result<Json<Vec<ContactMessage>>, ApiError> {
    let rows = run_db(&state, |db| db.list_messages()).await?;
    Ok(Json(rows.into_iter().map(convert::message).collect()))
}

/// PUT /api/messages/{id}/read: `{"read": false}` marks it unread again.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<ReadUpdate>,
) -> Result<Json<Success>, ApiError> {
    let read = update.read;
    if !run_db(&state, move |db| db.mark_message_read(id, read)).await? {
        return Err(ApiError::not_found("Message not found"));
    }
    info!("{} marked message {} as {}", claims.username, id, if read { "read" } else { "unread" });
    Ok(Json(Success::ok()))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Success>, ApiError> {
    if !run_db(&state, move |db| db.delete_message(id)).await? {
        return Err(ApiError::not_found("Message not found"));
    }
    info!("{} deleted message {}", claims.username, id);
    Ok(Json(Success::ok()))
}
