use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    api::AppState,
    auth::CurrentUser,
    error::{AppError, AppResult},
    services::social::{self, ToggleOutcome},
};

#[derive(Debug, Deserialize)]
pub struct ReactionRequest {
    user_item_id: i64,
    emoji: String,
}

pub async fn react(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ReactionRequest>,
) -> AppResult<Json<Value>> {
    social::add_reaction(
        state.repo.as_ref(),
        user.id,
        request.user_item_id,
        &request.emoji,
    )
    .await?;
    Ok(super::ok())
}

pub async fn toggle_reaction(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ReactionRequest>,
) -> AppResult<Json<ToggleOutcome>> {
    let outcome = social::toggle_reaction(
        state.repo.as_ref(),
        user.id,
        request.user_item_id,
        &request.emoji,
    )
    .await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    user_item_id: i64,
    content: String,
}

/// Adds a comment; store failures answer `{ok: false}` with a 500
pub async fn comment(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CommentRequest>,
) -> Result<Json<Value>, axum::response::Response> {
    match social::add_comment(
        state.repo.as_ref(),
        user.id,
        request.user_item_id,
        &request.content,
    )
    .await
    {
        Ok(comment) => Ok(Json(json!({ "ok": true, "comment": comment }))),
        Err(e @ AppError::InvalidInput(_)) => Err(e.into_response()),
        Err(_) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "ok": false })),
        )
            .into_response()),
    }
}
