use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    api::AppState,
    auth::{CurrentUser, MaybeUser},
    error::{AppError, AppResult},
    models::FeedPage,
    services::feed,
};

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    cursor: Option<String>,
    limit: Option<String>,
}

/// Handler for the global activity feed
pub async fn feed(
    State(state): State<Arc<AppState>>,
    viewer: MaybeUser,
    Query(params): Query<FeedQuery>,
) -> AppResult<Json<FeedPage>> {
    let cursor = params
        .cursor
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .map(|c| {
            DateTime::parse_from_rfc3339(c.trim())
                .map(|t| t.with_timezone(&Utc))
                .map_err(|_| AppError::InvalidInput(format!("Invalid cursor '{}'", c)))
        })
        .transpose()?;
    let limit = feed::clamp_limit(params.limit.as_deref());

    let page = feed::feed_page(state.repo.as_ref(), viewer.id(), cursor, limit).await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
pub struct HideRequest {
    item_id: Option<i64>,
}

fn require_item(item_id: Option<i64>) -> AppResult<i64> {
    item_id.ok_or_else(|| AppError::InvalidInput("item_id required".to_string()))
}

pub async fn hide(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<HideRequest>,
) -> AppResult<Json<Value>> {
    let item_id = require_item(request.item_id)?;
    state.repo.hide_item(user.id, item_id).await?;
    tracing::info!(user_id = %user.id, item_id, "Item hidden from feed");
    Ok(super::ok())
}

pub async fn unhide(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<HideRequest>,
) -> AppResult<Json<Value>> {
    let item_id = require_item(params.item_id)?;
    state.repo.unhide_item(user.id, item_id).await?;
    Ok(super::ok())
}

#[derive(Debug, Deserialize)]
pub struct MuteRequest {
    muted_user_id: Option<Uuid>,
}

fn require_muted(user_id: Uuid, muted_user_id: Option<Uuid>) -> AppResult<Uuid> {
    match muted_user_id {
        None => Err(AppError::InvalidInput("muted_user_id required".to_string())),
        Some(id) if id == user_id => Err(AppError::InvalidInput(
            "You cannot mute yourself".to_string(),
        )),
        Some(id) => Ok(id),
    }
}

pub async fn mute(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<MuteRequest>,
) -> AppResult<Json<Value>> {
    let muted = require_muted(user.id, request.muted_user_id)?;
    state.repo.mute_user(user.id, muted).await?;
    tracing::info!(user_id = %user.id, muted_user_id = %muted, "User muted");
    Ok(super::ok())
}

pub async fn unmute(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<MuteRequest>,
) -> AppResult<Json<Value>> {
    let muted = require_muted(user.id, params.muted_user_id)?;
    state.repo.unmute_user(user.id, muted).await?;
    Ok(super::ok())
}
